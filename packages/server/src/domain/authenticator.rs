//! Identity collaborator interface.

use async_trait::async_trait;

use super::{AuthError, Identity};

/// Verifies the credential a client presents at handshake time.
///
/// Any error is a hard rejection: the connection never joins a room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}
