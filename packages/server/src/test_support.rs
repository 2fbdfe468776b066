//! Test doubles shared by unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::{
    domain::{Connection, Identity, LanguageCode, Timestamp, Transport, TransportError},
    infrastructure::translator::DictionaryTranslator,
};

/// Transport that records every frame it is asked to send.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<String>>,
    failing: AtomicBool,
    closed: AtomicBool,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Make every later `send` fail, like a peer whose socket broke.
    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, payload: String) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Send("broken pipe".to_string()));
        }
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }

    async fn receive(&self) -> Result<String, TransportError> {
        Err(TransportError::Closed)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A connection named `name` that reads `language`, plus its transport.
pub fn connection_with(name: &str, language: &str) -> (Arc<Connection>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let connection = Arc::new(Connection::new(
        transport.clone(),
        Identity::new(name, None),
        Timestamp::new(0),
    ));
    connection.update_preferences(Some(LanguageCode::new(language).unwrap()), None);
    (connection, transport)
}

pub fn dictionary_translator() -> DictionaryTranslator {
    DictionaryTranslator::with_defaults()
}
