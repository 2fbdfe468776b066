//! UseCase layer: one struct per operation, composed by `ChatSession` and the ui layer.

mod chat_session;
mod connect_participant;
mod disconnect_participant;
mod error;
mod get_rooms;
mod send_message;
mod update_preferences;

pub use chat_session::{ChatSession, SessionEnd, SessionPhase, SessionUseCases};
pub use connect_participant::{ConnectParticipantUseCase, Handshake};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, GetRoomDetailError, SendMessageError};
pub use get_rooms::{GetRoomDetailUseCase, GetRoomsUseCase, RoomDetail};
pub use send_message::SendMessageUseCase;
pub use update_preferences::UpdatePreferencesUseCase;
