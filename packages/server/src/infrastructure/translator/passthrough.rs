use async_trait::async_trait;

use crate::domain::{TranslationError, Translator};

/// Translator used when no backend is configured: every text is delivered as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}
