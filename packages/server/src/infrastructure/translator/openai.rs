//! OpenAI chat-completions を使った Translator 実装
//!
//! 1 回の翻訳につき 1 回 `POST {base_url}/chat/completions` を呼ぶ。
//! 送信者と受信者の言語が同じ場合は API を呼ばない。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{TranslationError, Translator};

pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiTranslator {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    const MAX_TOKENS: u32 = 1000;
    const TEMPERATURE: f32 = 0.7;

    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::Request(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn prompt(text: &str, from: &str, to: &str) -> String {
        format!("Translate the following text from {from} to {to}:\n\n{text}")
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslationError> {
        if from == to {
            return Ok(text.to_string());
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content: Self::prompt(text, from, to),
            }],
            max_tokens: Self::MAX_TOKENS,
            temperature: Self::TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        let translated = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(TranslationError::EmptyResponse)?;

        tracing::debug!("Translated {} -> {} ({} chars)", from, to, translated.chars().count());
        Ok(translated)
    }
}
