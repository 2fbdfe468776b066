//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{AuthError, ValueObjectError};

/// Handshake rejection. The connection never joins a room.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("invalid room id: {0}")]
    InvalidRoomId(#[from] ValueObjectError),
    #[error("authentication rejected: {0}")]
    AuthRejected(#[from] AuthError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("message text is empty")]
    EmptyMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
