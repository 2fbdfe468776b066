//! Domain layer: rooms, connections and the collaborator interfaces they depend on.
//!
//! Infrastructure implements the traits defined here (`Transport`,
//! `Translator`, `Authenticator`); nothing in this layer depends on a
//! concrete transport or backend.

mod authenticator;
mod connection;
mod error;
mod message;
mod registry;
mod room;
mod translator;
mod value_object;

pub use authenticator::Authenticator;
pub use connection::{Connection, Identity, Preferences, Transport};
pub use error::{AuthError, DecodeError, TranslationError, TransportError, ValueObjectError};
pub use message::{InboundMessage, MessageType, OutboundMessage};
pub use registry::{RoomRegistry, RoomSummary};
pub use room::{BroadcastReport, MemberSnapshot, Room};
pub use translator::Translator;
pub use value_object::{ConnectionId, LanguageCode, RoomId, Timestamp};

#[cfg(test)]
pub use authenticator::MockAuthenticator;
#[cfg(test)]
pub use connection::MockTransport;
#[cfg(test)]
pub use translator::MockTranslator;
