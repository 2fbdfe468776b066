//! UseCase: 参加者切断処理

use crate::domain::{Connection, Room};

/// 参加者切断のユースケース
///
/// Removes the connection from its room and closes its transport. Both steps
/// are idempotent, so a second call for the same connection is harmless.
#[derive(Debug, Default)]
pub struct DisconnectParticipantUseCase;

impl DisconnectParticipantUseCase {
    pub fn new() -> Self {
        Self
    }

    /// Returns whether the connection was still a member.
    pub async fn execute(&self, room: &Room, connection: &Connection) -> bool {
        let was_member = room.remove_member(connection.id()).await;
        connection.close().await;
        if was_member {
            tracing::info!(
                "'{}' ({}) disconnected from room '{}'",
                connection.display_name(),
                connection.id(),
                room.id()
            );
        }
        was_member
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RoomId, RoomRegistry},
        test_support::connection_with,
    };

    #[tokio::test]
    async fn test_disconnect_removes_member_and_closes_transport() {
        // テスト項目: 切断で Room から外れ、トランスポートが閉じられる
        // given (前提条件):
        let registry = RoomRegistry::new();
        let room_id = RoomId::new("r1".to_string()).unwrap();
        let (alice, alice_out) = connection_with("A", "en");
        let (bob, _) = connection_with("B", "en");
        let room = registry.join(&room_id, alice.clone()).await;
        registry.join(&room_id, bob.clone()).await;
        let usecase = DisconnectParticipantUseCase::new();

        // when (操作):
        let first = usecase.execute(&room, &alice).await;
        let second = usecase.execute(&room, &alice).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(alice_out.is_closed());
        assert_eq!(room.member_count().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_of_last_member_removes_room() {
        // テスト項目: 最後の参加者が切断すると Room が registry から消える
        // given (前提条件):
        let registry = RoomRegistry::new();
        let room_id = RoomId::new("r2".to_string()).unwrap();
        let (alice, _) = connection_with("A", "en");
        let room = registry.join(&room_id, alice.clone()).await;

        // when (操作):
        DisconnectParticipantUseCase::new().execute(&room, &alice).await;

        // then (期待する結果):
        assert!(registry.list().await.is_empty());
    }
}
