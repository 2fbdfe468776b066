//! Wire-level messages exchanged with participants.
//!
//! Every frame is a JSON object discriminated by its `type` field. Nothing is
//! stored: a message lives only for the duration of its delivery.

use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Message sent by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundMessage {
    /// `{"type":"preferences","language":"ja","name":"Alice"}`
    Preferences {
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    /// `{"type":"message","text":"hello"}`
    Message {
        #[serde(default)]
        text: String,
    },
}

impl InboundMessage {
    /// Decode one text frame. Unknown `type` values are decode errors too.
    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Message,
}

/// Chat line delivered to a recipient, already rendered in their language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub r#type: MessageType,
    pub text: String,
    /// Display name of the sender at the time of sending
    pub name: String,
}

impl OutboundMessage {
    pub fn chat(text: String, name: String) -> Self {
        Self {
            r#type: MessageType::Message,
            text,
            name,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
