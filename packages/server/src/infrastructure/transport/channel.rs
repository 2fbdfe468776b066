//! In-process `Transport` backed by tokio channels.
//!
//! `ChannelTransport::pair()` returns the server-side transport together with
//! a `ChannelPeer` that plays the remote participant. Dropping the peer (or
//! either of its halves) behaves like the participant disconnecting.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, watch};

use crate::domain::{Transport, TransportError};

pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<String>,
    inbound: Mutex<mpsc::UnboundedReceiver<String>>,
    closed: watch::Sender<bool>,
}

/// The participant's side of a [`ChannelTransport`].
pub struct ChannelPeer {
    /// Frames the participant sends to the server
    pub outgoing: mpsc::UnboundedSender<String>,
    /// Frames the server delivered to the participant
    pub incoming: mpsc::UnboundedReceiver<String>,
}

impl ChannelTransport {
    pub fn pair() -> (Self, ChannelPeer) {
        let (to_peer, from_server) = mpsc::unbounded_channel();
        let (to_server, from_peer) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        let transport = Self {
            outbound: to_peer,
            inbound: Mutex::new(from_peer),
            closed,
        };
        let peer = ChannelPeer {
            outgoing: to_server,
            incoming: from_server,
        };
        (transport, peer)
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl ChannelPeer {
    /// Send one frame to the server. Returns `false` once the server side is gone.
    pub fn send(&self, payload: impl Into<String>) -> bool {
        self.outgoing.send(payload.into()).is_ok()
    }

    /// Wait for the next frame delivered by the server.
    pub async fn recv(&mut self) -> Option<String> {
        self.incoming.recv().await
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, payload: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(payload)
            .map_err(|_| TransportError::Send("peer dropped".to_string()))
    }

    async fn receive(&self) -> Result<String, TransportError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(TransportError::Closed);
        }
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            message = inbound.recv() => message.ok_or(TransportError::Closed),
            _ = closed.changed() => Err(TransportError::Closed),
        }
    }

    async fn close(&self) {
        self.closed.send_replace(true);
    }
}
