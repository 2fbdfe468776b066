//! Google userinfo を使った Authenticator 実装
//!
//! クライアントが OAuth ログインで得たアクセストークンをそのまま資格情報として受け取り、
//! userinfo エンドポイントに問い合わせて名前とメールアドレスを得る。
//! トークンの発行（ログインフロー）はこのサーバーの責務ではない。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{AuthError, Authenticator, Identity};

pub struct GoogleAuthenticator {
    client: reqwest::Client,
    userinfo_url: String,
}

#[derive(Deserialize)]
struct GoogleUser {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl GoogleAuthenticator {
    pub const USERINFO_URL: &'static str = "https://www.googleapis.com/oauth2/v2/userinfo";

    pub fn new(timeout: Duration) -> Result<Self, AuthError> {
        Self::with_userinfo_url(Self::USERINFO_URL, timeout)
    }

    pub fn with_userinfo_url(url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Ok(Self {
            client,
            userinfo_url: url.into(),
        })
    }
}

#[async_trait]
impl Authenticator for GoogleAuthenticator {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        if credential.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected(format!(
                "identity provider returned {status}"
            )));
        }

        let user: GoogleUser = response
            .json()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let email = user.email.filter(|email| !email.trim().is_empty());
        let display_name = user
            .name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| email.clone())
            .ok_or_else(|| AuthError::Rejected("profile has neither name nor email".to_string()))?;

        Ok(Identity::new(display_name, email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::get};
    use serde_json::json;

    async fn spawn_userinfo() -> String {
        let router = Router::new().route(
            "/userinfo",
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer good") => Ok(Json(json!({
                        "id": "1",
                        "email": "alice@example.com",
                        "verified_email": true,
                        "name": "Alice"
                    }))),
                    Some("Bearer nameless") => Ok(Json(json!({"email": "bob@example.com"}))),
                    Some("Bearer empty") => Ok(Json(json!({}))),
                    _ => Err(StatusCode::UNAUTHORIZED),
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/userinfo")
    }

    async fn authenticator() -> GoogleAuthenticator {
        GoogleAuthenticator::with_userinfo_url(spawn_userinfo().await, Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_returns_identity() {
        // テスト項目: 有効なトークンで名前とメールアドレスが得られる
        // given (前提条件):
        let authenticator = authenticator().await;

        // when (操作):
        let identity = authenticator.verify("good").await;

        // then (期待する結果):
        assert_eq!(
            identity,
            Ok(Identity::new("Alice", Some("alice@example.com".to_string())))
        );
    }

    #[tokio::test]
    async fn test_missing_name_falls_back_to_email() {
        // テスト項目: 名前がないプロフィールではメールアドレスを表示名にする
        let identity = authenticator().await.verify("nameless").await.unwrap();

        assert_eq!(identity.display_name, "bob@example.com");
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        // テスト項目: userinfo が 401 を返すトークンは拒否される
        let result = authenticator().await.verify("bad").await;

        assert!(matches!(result, Err(AuthError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_empty_profile_is_rejected() {
        // テスト項目: 名前もメールもないプロフィールは拒否される
        let result = authenticator().await.verify("empty").await;

        assert!(matches!(result, Err(AuthError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_blank_credential_is_missing() {
        // テスト項目: 空のトークンは問い合わせずに MissingCredential
        let authenticator =
            GoogleAuthenticator::with_userinfo_url("http://127.0.0.1:1/", Duration::from_secs(1))
                .unwrap();

        let result = authenticator.verify("  ").await;

        assert_eq!(result, Err(AuthError::MissingCredential));
    }
}
