//! 固定の対訳表を使った Translator 実装
//!
//! 外部 API を使わずに翻訳の流れを確認するためのもの。
//! 対訳表にない組み合わせは原文をそのまま返す。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{TranslationError, Translator};

#[derive(Debug, Clone, Default)]
pub struct DictionaryTranslator {
    /// Key: `"{from}->{to}:{text}"`
    entries: HashMap<String, String>,
}

impl DictionaryTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small English/Japanese phrase table.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_entry("en", "ja", "hello", "こんにちは")
            .with_entry("ja", "en", "こんにちは", "hello")
            .with_entry("en", "ja", "how are you", "お元気ですか？")
            .with_entry("ja", "en", "お元気ですか？", "how are you")
    }

    pub fn with_entry(mut self, from: &str, to: &str, text: &str, translation: &str) -> Self {
        self.entries
            .insert(Self::key(from, to, text), translation.to_string());
        self
    }

    fn key(from: &str, to: &str, text: &str) -> String {
        format!("{from}->{to}:{text}")
    }
}

#[async_trait]
impl Translator for DictionaryTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslationError> {
        if from == to {
            return Ok(text.to_string());
        }
        Ok(self
            .entries
            .get(&Self::key(from, to, text))
            .cloned()
            .unwrap_or_else(|| text.to_string()))
    }
}
