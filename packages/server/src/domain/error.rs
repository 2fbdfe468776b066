//! Error taxonomy of the relay core.
//!
//! None of these errors is fatal to the process: the worst outcome of any of
//! them is that one connection (or one empty room) goes away.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    EmptyRoomId,
    #[error("language code must not be empty")]
    EmptyLanguage,
    #[error("language code is too long ({0} bytes)")]
    LanguageTooLong(usize),
}

/// Failure of the underlying message channel to a participant.
///
/// A send failure marks the recipient as dead; a receive failure ends the
/// connection's own message loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("failed to send message: {0}")]
    Send(String),
    #[error("failed to receive message: {0}")]
    Receive(String),
}

/// Failure reported by the translation backend. Always recovered by
/// delivering the original text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Request(String),
    #[error("translation backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("translation backend returned no result")]
    EmptyResponse,
}

/// Credential verification failure. Rejects the handshake before any room
/// registration happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("credential is missing")]
    MissingCredential,
    #[error("credential rejected: {0}")]
    Rejected(String),
    #[error("identity provider request failed: {0}")]
    Request(String),
}

/// Inbound payload that could not be decoded into a known message.
#[derive(Debug, Error)]
#[error("malformed message: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);
