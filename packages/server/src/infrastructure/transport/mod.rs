//! `Transport` implementations.
//!
//! - `websocket`: axum WebSocket connections (production)
//! - `channel`: in-process channel pair, for embedding and tests

pub mod channel;
pub mod websocket;

pub use channel::{ChannelPeer, ChannelTransport};
pub use websocket::WebSocketTransport;
