//! UseCase: 参加者接続処理
//!
//! ## 流れ
//!
//! 1. `authenticate`: upgrade 前に RoomId と資格情報を検証する（失敗したら接続拒否）
//! 2. `execute`: upgrade 後、認証済みの [`Handshake`] を使って Room に参加する
//!
//! `Handshake` は `authenticate` の成功でしか作れないため、
//! 認証を経ずに Room へ登録される経路は型の上で存在しない。

use std::sync::Arc;

use shabe_shared::time::Clock;

use crate::domain::{
    Authenticator, Connection, Identity, Room, RoomId, RoomRegistry, Timestamp, Transport,
};

use super::{SessionPhase, error::ConnectError};

/// Proof that a handshake passed validation and authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    room_id: RoomId,
    identity: Identity,
    phase: SessionPhase,
}

impl Handshake {
    /// Phase the connection is in until it joins its room.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    authenticator: Arc<dyn Authenticator>,
    registry: Arc<RoomRegistry>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        registry: Arc<RoomRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authenticator,
            registry,
            clock,
        }
    }

    /// Validate the room id and verify the credential.
    ///
    /// The room id is checked first so that a malformed request never reaches
    /// the identity provider.
    pub async fn authenticate(
        &self,
        room_id: String,
        credential: &str,
    ) -> Result<Handshake, ConnectError> {
        let subject = format!("Handshake for room '{}'", room_id);
        let phase = SessionPhase::Connecting.advance(SessionPhase::Authenticating, &subject);
        match self.verify(room_id, credential).await {
            Ok((room_id, identity)) => {
                tracing::debug!(
                    "Authenticated '{}' for room '{}'",
                    identity.display_name,
                    room_id
                );
                Ok(Handshake {
                    room_id,
                    identity,
                    phase,
                })
            }
            Err(e) => {
                phase.advance(SessionPhase::Closed, &subject);
                Err(e)
            }
        }
    }

    async fn verify(
        &self,
        room_id: String,
        credential: &str,
    ) -> Result<(RoomId, Identity), ConnectError> {
        let room_id = RoomId::new(room_id)?;
        let identity = self.authenticator.verify(credential).await?;
        Ok((room_id, identity))
    }

    /// Wrap the upgraded transport in a connection and add it to the room.
    pub async fn execute(
        &self,
        handshake: Handshake,
        transport: Arc<dyn Transport>,
    ) -> (Arc<Room>, Arc<Connection>) {
        let connected_at = Timestamp::new(self.clock.now_millis());
        let connection = Arc::new(Connection::new(transport, handshake.identity, connected_at));
        let room = self
            .registry
            .join(&handshake.room_id, Arc::clone(&connection))
            .await;
        (room, connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{AuthError, MockAuthenticator, ValueObjectError},
        test_support::RecordingTransport,
    };
    use shabe_shared::time::FixedClock;

    fn create_usecase(
        authenticator: MockAuthenticator,
    ) -> (ConnectParticipantUseCase, Arc<RoomRegistry>) {
        let registry = RoomRegistry::new();
        let usecase = ConnectParticipantUseCase::new(
            Arc::new(authenticator),
            registry.clone(),
            Arc::new(FixedClock::new(5_000)),
        );
        (usecase, registry)
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        // テスト項目: 有効な RoomId と資格情報で Handshake が得られる
        // given (前提条件):
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_verify()
            .times(1)
            .returning(|_| Ok(Identity::new("Alice", Some("alice@example.com".to_string()))));
        let (usecase, _) = create_usecase(authenticator);

        // when (操作):
        let handshake = usecase.authenticate("r1".to_string(), "token").await.unwrap();

        // then (期待する結果):
        assert_eq!(handshake.room_id().as_str(), "r1");
        assert_eq!(handshake.identity().display_name, "Alice");
        assert_eq!(handshake.phase(), SessionPhase::Authenticating);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_blank_room_before_verifying() {
        // テスト項目: RoomId が空なら認証プロバイダに問い合わせずに拒否する
        // given (前提条件):
        let mut authenticator = MockAuthenticator::new();
        authenticator.expect_verify().never();
        let (usecase, _) = create_usecase(authenticator);

        // when (操作):
        let result = usecase.authenticate(String::new(), "token").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::InvalidRoomId(ValueObjectError::EmptyRoomId))
        );
    }

    #[tokio::test]
    async fn test_authenticate_rejection_registers_nothing() {
        // テスト項目: 認証失敗時は AuthRejected となり、Room は作られない
        // given (前提条件):
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_verify()
            .returning(|_| Err(AuthError::Rejected("expired".to_string())));
        let (usecase, registry) = create_usecase(authenticator);

        // when (操作):
        let result = usecase.authenticate("r1".to_string(), "stale").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::AuthRejected(AuthError::Rejected(
                "expired".to_string()
            )))
        );
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_execute_joins_room_with_identity() {
        // テスト項目: execute で接続が作られ、Room に参加する
        // given (前提条件):
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_verify()
            .returning(|_| Ok(Identity::new("Alice", None)));
        let (usecase, registry) = create_usecase(authenticator);
        let handshake = usecase.authenticate("r1".to_string(), "token").await.unwrap();

        // when (操作):
        let (room, connection) = usecase
            .execute(handshake, Arc::new(RecordingTransport::default()))
            .await;

        // then (期待する結果):
        assert_eq!(room.id().as_str(), "r1");
        assert!(room.contains(connection.id()).await);
        assert_eq!(connection.display_name(), "Alice");
        assert_eq!(connection.language().as_str(), "en");
        assert_eq!(connection.connected_at(), Timestamp::new(5_000));
        assert_eq!(registry.count().await, 1);
    }
}
