//! Translation collaborator interface.

use async_trait::async_trait;

use super::TranslationError;

/// Renders a text written in one language into another.
///
/// Called once per recipient whose language differs from the sender's. An
/// error is never fatal: the caller falls back to the original text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslationError>;
}
