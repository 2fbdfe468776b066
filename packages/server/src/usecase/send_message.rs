//! UseCase: メッセージ送信処理
//!
//! 送信者の現在の言語・表示名を読み取り、Room の broadcast に渡す。
//! 受信者ごとの翻訳と失敗時の扱いは `Room::broadcast` が担う。

use std::sync::Arc;

use crate::domain::{BroadcastReport, Connection, Room, Translator};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    translator: Arc<dyn Translator>,
}

impl SendMessageUseCase {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    /// Broadcast `text` from `sender` to the rest of `room`.
    ///
    /// An empty text is rejected with [`SendMessageError::EmptyMessage`] and
    /// nothing is sent.
    pub async fn execute(
        &self,
        room: &Room,
        sender: &Connection,
        text: &str,
    ) -> Result<BroadcastReport, SendMessageError> {
        if text.is_empty() {
            return Err(SendMessageError::EmptyMessage);
        }

        let preferences = sender.preferences();
        let report = room
            .broadcast(
                sender.id(),
                text,
                &preferences.language,
                &preferences.display_name,
                self.translator.as_ref(),
            )
            .await;
        tracing::info!(
            "'{}' sent a message to room '{}' (delivered: {}/{})",
            preferences.display_name,
            room.id(),
            report.delivered,
            report.recipients
        );
        Ok(report)
    }
}
