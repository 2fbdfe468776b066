//! UseCase: ルーム一覧・詳細の取得（診断用）

use std::sync::Arc;

use crate::domain::{MemberSnapshot, RoomId, RoomRegistry, RoomSummary, Timestamp};

use super::error::GetRoomDetailError;

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    registry: Arc<RoomRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self) -> Vec<RoomSummary> {
        self.registry.list().await
    }
}

/// A room and its current members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub id: RoomId,
    pub created_at: Timestamp,
    pub members: Vec<MemberSnapshot>,
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    registry: Arc<RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, room_id: String) -> Result<RoomDetail, GetRoomDetailError> {
        // A blank id cannot name an existing room
        let room_id = RoomId::new(room_id).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        let room = self
            .registry
            .get(&room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)?;
        Ok(RoomDetail {
            id: room.id().clone(),
            created_at: room.created_at(),
            members: room.members().await,
        })
    }
}
