//! WebSocket connection handler.
//!
//! The room id and credential are checked before the upgrade, so a rejected
//! client gets a plain HTTP error and never joins a room.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    domain::AuthError,
    infrastructure::transport::WebSocketTransport,
    ui::state::AppState,
    usecase::{ChatSession, ConnectError, Handshake},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(rename = "roomId")]
    pub room_id: Option<String>,
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(room_id) = query.room_id.filter(|id| !id.trim().is_empty()) else {
        tracing::warn!("Rejecting connection without roomId");
        return Err(StatusCode::BAD_REQUEST);
    };
    let Some(credential) = query
        .token
        .filter(|token| !token.trim().is_empty())
        .or_else(|| bearer_token(&headers))
    else {
        tracing::warn!("Rejecting connection to room '{}' without credential", room_id);
        return Err(StatusCode::BAD_REQUEST);
    };

    let handshake = state
        .session_usecases
        .connect
        .authenticate(room_id, &credential)
        .await
        .map_err(|e| {
            tracing::warn!("Rejecting connection: {}", e);
            rejection_status(&e)
        })?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, handshake)))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn rejection_status(error: &ConnectError) -> StatusCode {
    match error {
        ConnectError::InvalidRoomId(_) | ConnectError::AuthRejected(AuthError::MissingCredential) => {
            StatusCode::BAD_REQUEST
        }
        ConnectError::AuthRejected(_) => StatusCode::UNAUTHORIZED,
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, handshake: Handshake) {
    let transport = Arc::new(WebSocketTransport::new(socket));
    let session = ChatSession::start(state.session_usecases.clone(), handshake, transport).await;
    let connection_id = session.connection().id();
    let end = session.run().await;
    tracing::debug!("WebSocket session '{}' finished: {:?}", connection_id, end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_is_read_from_authorization_header() {
        // テスト項目: Authorization: Bearer ヘッダーからトークンを取り出す
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));

        // when (操作):
        let token = bearer_token(&headers);

        // then (期待する結果):
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_non_bearer_authorization_is_ignored() {
        // テスト項目: Bearer 以外の Authorization ヘッダーや空トークンは無視される
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_rejection_status_codes() {
        // テスト項目: 不正な入力は 400、認証拒否は 401
        let invalid_room = ConnectError::InvalidRoomId(crate::domain::ValueObjectError::EmptyRoomId);
        assert_eq!(rejection_status(&invalid_room), StatusCode::BAD_REQUEST);

        let missing = ConnectError::AuthRejected(AuthError::MissingCredential);
        assert_eq!(rejection_status(&missing), StatusCode::BAD_REQUEST);

        let rejected = ConnectError::AuthRejected(AuthError::Rejected("unknown token".to_string()));
        assert_eq!(rejection_status(&rejected), StatusCode::UNAUTHORIZED);

        let unreachable = ConnectError::AuthRejected(AuthError::Request("timeout".to_string()));
        assert_eq!(rejection_status(&unreachable), StatusCode::UNAUTHORIZED);
    }
}
