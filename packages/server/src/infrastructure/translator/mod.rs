//! `Translator` implementations.
//!
//! - `openai`: OpenAI chat-completions backend
//! - `dictionary`: fixed phrase table, for demos and tests
//! - `passthrough`: translation disabled, returns the original text

pub mod dictionary;
pub mod openai;
pub mod passthrough;

pub use dictionary::DictionaryTranslator;
pub use openai::OpenAiTranslator;
pub use passthrough::PassthroughTranslator;
