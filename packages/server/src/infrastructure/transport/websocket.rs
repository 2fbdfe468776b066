//! WebSocket を使った Transport 実装
//!
//! ## 責務
//!
//! - upgrade 済みの axum `WebSocket` を送信側と受信側に分割して保持
//! - テキストフレーム単位の送受信
//!
//! 送信側と受信側は別々のロックで守られているため、他の接続からの broadcast
//! による送信と、この接続自身のメッセージループによる受信は互いを待たない。

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::Mutex;

use crate::domain::{Transport, TransportError};

pub struct WebSocketTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
    closed: AtomicBool,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&self, payload: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.sink
            .lock()
            .await
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn receive(&self) -> Result<String, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Binary(bytes))) => {
                    // Binary frames are passed through so the decoder can reject them.
                    return Ok(String::from_utf8_lossy(&bytes).into_owned());
                }
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                // Ping/pong is answered by the protocol layer
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
            }
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(Message::Close(None)).await {
            tracing::debug!("Close frame not delivered: {}", e);
        }
        if let Err(e) = sink.close().await {
            tracing::debug!("Failed to close WebSocket sink: {}", e);
        }
    }
}
