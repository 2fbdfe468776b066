//! Per-connection message loop.
//!
//! ```text
//! Connecting -> Authenticating -> Joined -> Closing -> Closed
//!                     |                                  ^
//!                     +------------ rejected ------------+
//! ```
//!
//! `Connecting` and `Authenticating` happen in the transport handler before
//! the upgrade (see [`ConnectParticipantUseCase::authenticate`]). A
//! `ChatSession` exists only for an authenticated connection and starts in
//! `Joined`. Whatever ends the loop, the connection leaves its room exactly
//! once through [`MembershipGuard`].

use std::{fmt, sync::Arc};

use crate::domain::{Connection, InboundMessage, Room, Transport, TransportError};

use super::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, Handshake, SendMessageError,
    SendMessageUseCase, UpdatePreferencesUseCase,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Authenticating,
    Joined,
    Closing,
    Closed,
}

impl SessionPhase {
    pub fn can_advance_to(self, next: SessionPhase) -> bool {
        use SessionPhase::{Authenticating, Closed, Closing, Connecting, Joined};
        matches!(
            (self, next),
            (Connecting, Authenticating)
                | (Authenticating, Joined | Closed)
                | (Joined, Closing)
                | (Closing, Closed)
        )
    }

    /// Log the move to `next` for `subject` and return `next`.
    ///
    /// An unexpected transition is logged as a warning but still taken.
    pub fn advance(self, next: SessionPhase, subject: impl fmt::Display) -> SessionPhase {
        if !self.can_advance_to(next) {
            tracing::warn!("{}: unexpected transition {} -> {}", subject, self, next);
        }
        tracing::debug!("{}: {} -> {}", subject, self, next);
        next
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Connecting => "connecting",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::Joined => "joined",
            SessionPhase::Closing => "closing",
            SessionPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why the message loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The participant closed the channel
    PeerClosed,
    /// Reading from the channel failed
    TransportFailed(TransportError),
    /// A broadcast could not write to this connection and removed it from the room
    Evicted,
}

/// Use cases a session needs, shared by all sessions.
#[derive(Clone)]
pub struct SessionUseCases {
    pub connect: Arc<ConnectParticipantUseCase>,
    pub disconnect: Arc<DisconnectParticipantUseCase>,
    pub send_message: Arc<SendMessageUseCase>,
    pub update_preferences: Arc<UpdatePreferencesUseCase>,
}

/// Releases room membership exactly once.
///
/// [`release`](Self::release) is the normal path. If the owning session is
/// dropped before that (the task was cancelled), `Drop` hands the removal to
/// the runtime instead.
struct MembershipGuard {
    room: Arc<Room>,
    connection: Arc<Connection>,
    disconnect: Arc<DisconnectParticipantUseCase>,
    released: bool,
}

impl MembershipGuard {
    async fn release(mut self) {
        self.disconnect.execute(&self.room, &self.connection).await;
        self.released = true;
    }
}

impl Drop for MembershipGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let room = Arc::clone(&self.room);
        let connection = Arc::clone(&self.connection);
        let disconnect = Arc::clone(&self.disconnect);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    disconnect.execute(&room, &connection).await;
                });
            }
            Err(_) => tracing::error!(
                "No runtime to release connection '{}' from room '{}'",
                self.connection.id(),
                self.room.id()
            ),
        }
    }
}

pub struct ChatSession {
    room: Arc<Room>,
    connection: Arc<Connection>,
    usecases: SessionUseCases,
    phase: SessionPhase,
    guard: Option<MembershipGuard>,
}

impl ChatSession {
    /// Join the handshake's room over `transport`.
    pub async fn start(
        usecases: SessionUseCases,
        handshake: Handshake,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let authenticated = handshake.phase();
        let (room, connection) = usecases.connect.execute(handshake, transport).await;
        let guard = MembershipGuard {
            room: Arc::clone(&room),
            connection: Arc::clone(&connection),
            disconnect: Arc::clone(&usecases.disconnect),
            released: false,
        };
        let phase = authenticated.advance(
            SessionPhase::Joined,
            format_args!("Connection '{}'", connection.id()),
        );
        Self {
            room,
            connection,
            usecases,
            phase,
            guard: Some(guard),
        }
    }

    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Process inbound messages until the connection ends, then leave the room.
    pub async fn run(mut self) -> SessionEnd {
        let end = self.message_loop().await;
        self.advance(SessionPhase::Closing);
        tracing::info!(
            "Connection '{}' in room '{}' ending: {:?}",
            self.connection.id(),
            self.room.id(),
            end
        );
        if let Some(guard) = self.guard.take() {
            guard.release().await;
        }
        self.advance(SessionPhase::Closed);
        end
    }

    async fn message_loop(&self) -> SessionEnd {
        loop {
            let payload = match self.connection.receive().await {
                Ok(payload) => payload,
                // Only a failed broadcast closes the connection while the loop runs
                Err(TransportError::Closed) if self.connection.is_closed() => {
                    return SessionEnd::Evicted;
                }
                Err(TransportError::Closed) => return SessionEnd::PeerClosed,
                Err(e) => return SessionEnd::TransportFailed(e),
            };
            if !self.room.contains(self.connection.id()).await {
                return SessionEnd::Evicted;
            }
            self.dispatch(&payload).await;
        }
    }

    async fn dispatch(&self, payload: &str) {
        let message = match InboundMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    "Discarding message from '{}': {}",
                    self.connection.id(),
                    e
                );
                return;
            }
        };

        match message {
            InboundMessage::Preferences { language, name } => {
                self.usecases.update_preferences.execute(
                    &self.connection,
                    language.as_deref(),
                    name.as_deref(),
                );
            }
            InboundMessage::Message { text } => {
                match self
                    .usecases
                    .send_message
                    .execute(&self.room, &self.connection, &text)
                    .await
                {
                    Ok(report) => tracing::debug!(
                        "Message from '{}' fanned out: {:?}",
                        self.connection.id(),
                        report
                    ),
                    Err(SendMessageError::EmptyMessage) => {
                        tracing::debug!("Ignoring empty message from '{}'", self.connection.id());
                    }
                }
            }
        }
    }

    fn advance(&mut self, next: SessionPhase) {
        self.phase = self
            .phase
            .advance(next, format_args!("Connection '{}'", self.connection.id()));
    }
}
