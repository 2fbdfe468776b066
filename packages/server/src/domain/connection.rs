//! Connection abstraction: one live channel to one participant plus the
//! participant's mutable preferences.
//!
//! ## Preference discipline
//!
//! `display_name` and `language` sit behind a per-connection lock that is never
//! held across an `.await`. The connection's own [`ChatSession`] is the only
//! writer; broadcasts running on other connections' tasks only take snapshots.
//! A recipient therefore sees either the old or the new preferences, never a
//! torn mix of both.
//!
//! [`ChatSession`]: crate::usecase::ChatSession

use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use super::{ConnectionId, LanguageCode, Timestamp, TransportError};

/// Bidirectional text channel to a single participant.
///
/// One implementation exists per transport kind (WebSocket, in-process
/// channel). Message boundaries are preserved: one `send` is one frame.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one message to the participant.
    async fn send(&self, payload: String) -> Result<(), TransportError>;

    /// Wait for the next text message. Returns [`TransportError::Closed`] once
    /// the peer has gone away.
    async fn receive(&self) -> Result<String, TransportError>;

    /// Release the channel. Calling it more than once is harmless.
    async fn close(&self);
}

/// Verified identity returned by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(display_name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email,
        }
    }
}

/// Snapshot of a participant's mutable preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub display_name: String,
    pub language: LanguageCode,
}

pub struct Connection {
    id: ConnectionId,
    email: Option<String>,
    connected_at: Timestamp,
    preferences: RwLock<Preferences>,
    transport: Arc<dyn Transport>,
    closed: AtomicBool,
}

impl Connection {
    /// Wrap a transport whose peer has been authenticated as `identity`.
    pub fn new(transport: Arc<dyn Transport>, identity: Identity, connected_at: Timestamp) -> Self {
        Self {
            id: ConnectionId::generate(),
            email: identity.email,
            connected_at,
            preferences: RwLock::new(Preferences {
                display_name: identity.display_name,
                language: LanguageCode::default(),
            }),
            transport,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn language(&self) -> LanguageCode {
        self.preferences().language
    }

    pub fn display_name(&self) -> String {
        self.preferences().display_name
    }

    /// Apply a preferences update and return the resulting snapshot.
    ///
    /// `None` or a blank name leaves the corresponding field unchanged.
    pub fn update_preferences(
        &self,
        language: Option<LanguageCode>,
        display_name: Option<&str>,
    ) -> Preferences {
        let mut preferences = self
            .preferences
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(language) = language {
            preferences.language = language;
        }
        if let Some(name) = display_name.map(str::trim).filter(|name| !name.is_empty()) {
            preferences.display_name = name.to_string();
        }
        preferences.clone()
    }

    pub async fn send(&self, payload: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.transport.send(payload).await
    }

    pub async fn receive(&self) -> Result<String, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.transport.receive().await
    }

    /// Close the underlying transport once; later calls are no-ops.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.transport.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("preferences", &self.preferences())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
