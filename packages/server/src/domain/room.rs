//! Room: the set of connections currently in one named session.
//!
//! ## Locking
//!
//! One `RwLock` guards the member map. `add_member` and `remove_member` take
//! the write lock. `broadcast` takes the read lock only long enough to
//! snapshot the recipients; translation and network writes run with no lock
//! held, and recipients whose send failed are evicted afterwards in a single
//! write-locked pass.
//!
//! A room never removes itself from the registry directly. When a removal
//! leaves the map empty, the room asks the registry to drop it, and the
//! registry re-checks emptiness under its own lock (see [`RoomRegistry`]).
//! A dropped room is marked detached under the member write lock and refuses
//! further members, so nobody can end up in a room the registry no longer owns.

use std::{
    collections::HashMap,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use futures_util::future::join_all;
use tokio::sync::RwLock;

use super::{
    Connection, ConnectionId, LanguageCode, OutboundMessage, RoomId, RoomRegistry, Timestamp,
    TransportError, Translator,
};

pub struct Room {
    id: RoomId,
    created_at: Timestamp,
    members: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
    /// Set once the registry has dropped this room. Written only under the member write lock.
    detached: AtomicBool,
    /// Back-reference used only to request this room's removal.
    registry: Weak<RoomRegistry>,
}

/// Read-only view of one member, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub language: LanguageCode,
    pub connected_at: Timestamp,
}

/// Per-broadcast delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Members other than the sender at the time of the snapshot
    pub recipients: usize,
    /// Recipients that were written to successfully
    pub delivered: usize,
    /// Successful deliveries that carried a translated text
    pub translated: usize,
    /// Successful deliveries that fell back to the original text because translation failed
    pub fallbacks: usize,
    /// Recipients removed because the write to them failed
    pub evicted: usize,
}

/// How the text delivered to one recipient was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendering {
    Original,
    Translated,
    Fallback,
}

enum Outcome {
    Sent(Rendering),
    Failed(TransportError),
    Skipped,
}

impl Room {
    pub(crate) fn new(id: RoomId, created_at: Timestamp, registry: Weak<RoomRegistry>) -> Self {
        Self {
            id,
            created_at,
            members: RwLock::new(HashMap::new()),
            detached: AtomicBool::new(false),
            registry,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Insert a connection. Adding an existing member is a no-op.
    ///
    /// Returns `false` if the room has already been dropped by the registry;
    /// the caller must go through [`RoomRegistry::join`] to get a live room.
    pub async fn add_member(&self, connection: Arc<Connection>) -> bool {
        let mut members = self.members.write().await;
        if self.detached.load(Ordering::Acquire) {
            return false;
        }
        let connection_id = connection.id();
        if members.insert(connection_id, connection).is_none() {
            tracing::info!(
                "Connection '{}' joined room '{}' (members: {})",
                connection_id,
                self.id,
                members.len()
            );
        }
        true
    }

    /// Mark the room detached if it has no members. Called by the registry
    /// while it holds its own lock, right before dropping the room.
    pub(crate) async fn detach_if_empty(&self) -> bool {
        let members = self.members.write().await;
        if !members.is_empty() {
            return false;
        }
        self.detached.store(true, Ordering::Release);
        true
    }

    /// Remove a connection if present. Returns whether it was a member.
    ///
    /// The call that takes the member count from one to zero asks the
    /// registry to drop this room.
    pub async fn remove_member(&self, connection_id: ConnectionId) -> bool {
        let (removed, became_empty) = self.remove_members(&[connection_id]).await;
        if became_empty {
            self.request_removal().await;
        }
        removed > 0
    }

    pub async fn contains(&self, connection_id: ConnectionId) -> bool {
        self.members.read().await.contains_key(&connection_id)
    }

    pub async fn member_count(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Members sorted by connection time.
    pub async fn members(&self) -> Vec<MemberSnapshot> {
        let members = self.members.read().await;
        let mut snapshots: Vec<MemberSnapshot> = members
            .values()
            .map(|connection| {
                let preferences = connection.preferences();
                MemberSnapshot {
                    connection_id: connection.id(),
                    display_name: preferences.display_name,
                    language: preferences.language,
                    connected_at: connection.connected_at(),
                }
            })
            .collect();
        snapshots.sort_by_key(|member| member.connected_at);
        snapshots
    }

    /// Deliver `text` to every member except `sender`, each in its own language.
    ///
    /// Recipients sharing the sender's language get the text verbatim without
    /// a translator call. A failed translation degrades to the original text
    /// for that recipient only. A failed send evicts and closes that recipient
    /// only; delivery to the others is unaffected.
    pub async fn broadcast(
        &self,
        sender: ConnectionId,
        text: &str,
        sender_language: &LanguageCode,
        sender_name: &str,
        translator: &dyn Translator,
    ) -> BroadcastReport {
        let recipients: Vec<Arc<Connection>> = {
            let members = self.members.read().await;
            members
                .values()
                .filter(|connection| connection.id() != sender)
                .cloned()
                .collect()
        };

        let outcomes = join_all(recipients.iter().map(|recipient| {
            deliver(recipient, text, sender_language, sender_name, translator)
        }))
        .await;

        let mut report = BroadcastReport {
            recipients: recipients.len(),
            ..BroadcastReport::default()
        };
        let mut dead = Vec::new();
        for (recipient, outcome) in recipients.iter().zip(outcomes) {
            match outcome {
                Outcome::Sent(rendering) => {
                    report.delivered += 1;
                    match rendering {
                        Rendering::Translated => report.translated += 1,
                        Rendering::Fallback => report.fallbacks += 1,
                        Rendering::Original => {}
                    }
                }
                Outcome::Failed(e) => {
                    tracing::warn!(
                        "Dropping connection '{}' from room '{}': {}",
                        recipient.id(),
                        self.id,
                        e
                    );
                    dead.push(Arc::clone(recipient));
                }
                Outcome::Skipped => {}
            }
        }

        if !dead.is_empty() {
            let ids: Vec<ConnectionId> = dead.iter().map(|connection| connection.id()).collect();
            let (removed, became_empty) = self.remove_members(&ids).await;
            report.evicted = removed;
            for connection in &dead {
                connection.close().await;
            }
            if became_empty {
                self.request_removal().await;
            }
        }

        tracing::debug!("Broadcast in room '{}' from '{}': {:?}", self.id, sender, report);
        report
    }

    /// Remove the given members in one write-locked pass.
    ///
    /// Returns how many were actually removed and whether this pass emptied the room.
    async fn remove_members(&self, ids: &[ConnectionId]) -> (usize, bool) {
        let mut members = self.members.write().await;
        let mut removed = 0;
        for id in ids {
            if members.remove(id).is_some() {
                removed += 1;
                tracing::info!(
                    "Connection '{}' left room '{}' (members: {})",
                    id,
                    self.id,
                    members.len()
                );
            }
        }
        (removed, removed > 0 && members.is_empty())
    }

    /// Must be called without holding the member lock: the registry takes its
    /// own lock first and then re-reads this room.
    async fn request_removal(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_if_empty(self).await;
        }
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

async fn deliver(
    recipient: &Connection,
    text: &str,
    sender_language: &LanguageCode,
    sender_name: &str,
    translator: &dyn Translator,
) -> Outcome {
    let target = recipient.language();
    let (body, rendering) = if target == *sender_language {
        (text.to_string(), Rendering::Original)
    } else {
        match translator
            .translate(text, sender_language.as_str(), target.as_str())
            .await
        {
            Ok(translated) => (translated, Rendering::Translated),
            Err(e) => {
                tracing::warn!(
                    "Translation {} -> {} failed for '{}', sending original text: {}",
                    sender_language,
                    target,
                    recipient.id(),
                    e
                );
                (text.to_string(), Rendering::Fallback)
            }
        }
    };

    let payload = match OutboundMessage::chat(body, sender_name.to_string()).encode() {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to encode message for '{}': {}", recipient.id(), e);
            return Outcome::Skipped;
        }
    };

    match recipient.send(payload).await {
        Ok(()) => Outcome::Sent(rendering),
        Err(e) => Outcome::Failed(e),
    }
}
