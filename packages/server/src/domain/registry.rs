//! Room registry: the process-wide owner of every active room.
//!
//! ## 不変条件
//!
//! - ひとつの RoomId に対して Room インスタンスは高々ひとつ
//! - 作成と参加（`join`）は registry のロック内で一括して行う
//! - 削除は registry のロックを取った上で Room が空であることを再確認してから行う
//! - 削除された Room は detached になり、以後 `add_member` を拒否する
//!
//! ロックの取得順序は常に registry → room。Room は自分のロックを解放してから
//! registry に削除を依頼するため、デッドロックは起こらない。
//! 削除と参加が同じロックで直列化されるので、空になった直後に参加した接続が
//! 削除済みの Room に取り残されることもない。

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use shabe_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use super::{Connection, Room, RoomId, Timestamp};

/// Diagnostic summary of one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub member_count: usize,
    pub created_at: Timestamp,
}

pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, Arc<Room>>>,
    clock: Arc<dyn Clock>,
    self_ref: Weak<RoomRegistry>,
}

impl RoomRegistry {
    /// Create the registry. Rooms keep a weak back-reference to it, hence the `Arc`.
    pub fn new() -> Arc<Self> {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
            self_ref: self_ref.clone(),
        })
    }

    /// Return the room for `id`, creating it if absent.
    ///
    /// Check and insert happen under one lock, so concurrent callers with the
    /// same unseen id all receive the same instance. A room created here and
    /// never joined stays registered until someone calls [`remove`](Self::remove).
    pub async fn get_or_create(&self, id: &RoomId) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;
        self.entry(&mut rooms, id)
    }

    /// Get-or-create the room and add `connection` to it atomically with
    /// respect to room removal.
    pub async fn join(&self, id: &RoomId, connection: Arc<Connection>) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;
        loop {
            let room = self.entry(&mut rooms, id);
            if room.add_member(Arc::clone(&connection)).await {
                return room;
            }
            // Rooms are detached only while being dropped under this lock
            rooms.remove(id);
        }
    }

    /// Remove the room for `id` if it has no members. Returns whether it was removed.
    pub async fn remove(&self, id: &RoomId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(id).cloned() else {
            return false;
        };
        if !room.detach_if_empty().await {
            return false;
        }
        rooms.remove(id);
        tracing::info!("Room '{}' destroyed", id);
        true
    }

    /// Called by a room whose last member just left.
    ///
    /// Only this exact instance is removed, and only if it is still empty
    /// now that the registry lock is held.
    pub(crate) async fn remove_if_empty(&self, room: &Room) -> bool {
        let mut rooms = self.rooms.lock().await;
        let registered = rooms
            .get(room.id())
            .is_some_and(|current| std::ptr::eq(Arc::as_ptr(current), room));
        if !registered || !room.detach_if_empty().await {
            return false;
        }
        rooms.remove(room.id());
        tracing::info!("Room '{}' destroyed", room.id());
        true
    }

    pub async fn get(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Summaries of all rooms, sorted by id.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let rooms: Vec<Arc<Room>> = self.rooms.lock().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            summaries.push(RoomSummary {
                id: room.id().clone(),
                member_count: room.member_count().await,
                created_at: room.created_at(),
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    fn entry(&self, rooms: &mut HashMap<RoomId, Arc<Room>>, id: &RoomId) -> Arc<Room> {
        let room = rooms.entry(id.clone()).or_insert_with(|| {
            tracing::info!("Room '{}' created", id);
            Arc::new(Room::new(
                id.clone(),
                Timestamp::new(self.clock.now_millis()),
                self.self_ref.clone(),
            ))
        });
        Arc::clone(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::LanguageCode,
        test_support::{connection_with, dictionary_translator},
    };
    use shabe_shared::time::FixedClock;

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_instance() {
        // テスト項目: 同じ ID で get_or_create すると同じ Room が返る
        // given (前提条件):
        let registry = RoomRegistry::new();

        // when (操作):
        let first = registry.get_or_create(&room_id("r1")).await;
        let second = registry.get_or_create(&room_id("r1")).await;

        // then (期待する結果):
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_creates_one_room() {
        // テスト項目: 未知の ID に対する並行 get_or_create でも Room は 1 つだけ作られる
        // given (前提条件):
        let registry = RoomRegistry::new();

        // when (操作):
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get_or_create(&room_id("busy")).await })
            })
            .collect();
        let mut rooms = Vec::new();
        for handle in handles {
            rooms.push(handle.await.unwrap());
        }

        // then (期待する結果):
        assert_eq!(registry.count().await, 1);
        assert!(rooms.iter().all(|room| Arc::ptr_eq(room, &rooms[0])));
    }

    #[tokio::test]
    async fn test_last_member_leaving_removes_room() {
        // テスト項目: 唯一のメンバーが抜けると Room が registry から消える
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _) = connection_with("A", "en");
        let room = registry.join(&room_id("r2"), alice.clone()).await;

        // when (操作):
        room.remove_member(alice.id()).await;

        // then (期待する結果):
        assert!(registry.get(&room_id("r2")).await.is_none());
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_room_with_remaining_members_is_kept() {
        // テスト項目: メンバーが残っている間は Room は削除されない
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _) = connection_with("A", "en");
        let (bob, _) = connection_with("B", "en");
        let room = registry.join(&room_id("r1"), alice.clone()).await;
        registry.join(&room_id("r1"), bob.clone()).await;

        // when (操作):
        room.remove_member(alice.id()).await;
        let removed = registry.remove(&room_id("r1")).await;

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_only_removes_empty_rooms() {
        // テスト項目: remove は空の Room だけを削除し、存在しない ID は無視する
        // given (前提条件):
        let registry = RoomRegistry::new();
        registry.get_or_create(&room_id("empty")).await;

        // when (操作):
        let removed = registry.remove(&room_id("empty")).await;
        let removed_unknown = registry.remove(&room_id("unknown")).await;

        // then (期待する結果):
        assert!(removed);
        assert!(!removed_unknown);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_rejoin_after_room_destroyed_creates_fresh_room() {
        // テスト項目: 削除後に同じ ID で参加すると新しい Room が作られる
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _) = connection_with("A", "en");
        let old_room = registry.join(&room_id("r1"), alice.clone()).await;
        old_room.remove_member(alice.id()).await;

        // when (操作):
        let (bob, _) = connection_with("B", "en");
        let new_room = registry.join(&room_id("r1"), bob.clone()).await;

        // then (期待する結果):
        assert!(!Arc::ptr_eq(&old_room, &new_room));
        assert_eq!(new_room.member_count().await, 1);

        // 古い Room への削除依頼は新しい Room を消さない
        assert!(!registry.remove_if_empty(&old_room).await);
        assert!(registry.get(&room_id("r1")).await.is_some());
    }

    #[tokio::test]
    async fn test_join_racing_with_last_leave_never_loses_room() {
        // テスト項目: 最後の退出と参加が競合しても、参加者は登録済みの Room にいる
        // given (前提条件):
        let registry = RoomRegistry::new();

        for _ in 0..100 {
            let (alice, _) = connection_with("A", "en");
            let (bob, _) = connection_with("B", "en");
            let room = registry.join(&room_id("race"), alice.clone()).await;

            // when (操作): alice の退出と bob の参加を並行に実行
            let leave = {
                let room = room.clone();
                tokio::spawn(async move { room.remove_member(alice.id()).await })
            };
            let join = {
                let registry = registry.clone();
                let bob = bob.clone();
                tokio::spawn(async move { registry.join(&room_id("race"), bob).await })
            };
            leave.await.unwrap();
            let joined_room = join.await.unwrap();

            // then (期待する結果): bob が参加した Room は registry に登録されている
            let registered = registry.get(&room_id("race")).await.unwrap();
            assert!(Arc::ptr_eq(&registered, &joined_room));
            assert!(registered.contains(bob.id()).await);

            joined_room.remove_member(bob.id()).await;
            assert_eq!(registry.count().await, 0);
        }
    }

    #[tokio::test]
    async fn test_add_member_to_dropped_room_is_refused() {
        // テスト項目: get_or_create で得た Room が削除された後に add_member しても取り残されない
        // given (前提条件): 唯一のメンバー A が抜けて Room が削除される
        let registry = RoomRegistry::new();
        let (alice, _) = connection_with("A", "en");
        let (bob, _) = connection_with("B", "en");
        let (carol, _) = connection_with("C", "en");
        registry.join(&room_id("x"), alice.clone()).await;
        let stale = registry.get_or_create(&room_id("x")).await;
        stale.remove_member(alice.id()).await;

        // when (操作):
        let added = stale.add_member(bob.clone()).await;
        let bob_room = registry.join(&room_id("x"), bob.clone()).await;
        let carol_room = registry.join(&room_id("x"), carol.clone()).await;

        // then (期待する結果):
        assert!(!added);
        assert_eq!(stale.member_count().await, 0);
        assert!(!Arc::ptr_eq(&stale, &bob_room));
        assert!(Arc::ptr_eq(&bob_room, &carol_room));
        assert_eq!(carol_room.member_count().await, 2);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_eviction_of_last_recipient_can_empty_room() {
        // テスト項目: 送信者が既に退出していれば、送信失敗による削除で Room が空になり消える
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _) = connection_with("A", "en");
        let (bob, bob_out) = connection_with("B", "en");
        let room = registry.join(&room_id("r1"), alice.clone()).await;
        registry.join(&room_id("r1"), bob.clone()).await;
        room.remove_member(alice.id()).await;
        bob_out.fail_sends();

        // when (操作):
        let report = room
            .broadcast(
                alice.id(),
                "late message",
                &LanguageCode::default(),
                "A",
                &dictionary_translator(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(report.evicted, 1);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_counts_members() {
        // テスト項目: list は ID 順に並び、メンバー数と作成時刻を含む
        // given (前提条件):
        let registry = RoomRegistry::with_clock(Arc::new(FixedClock::new(42)));
        let (alice, _) = connection_with("A", "en");
        let (bob, _) = connection_with("B", "en");
        let (carol, _) = connection_with("C", "en");
        registry.join(&room_id("zeta"), alice).await;
        registry.join(&room_id("alpha"), bob).await;
        registry.join(&room_id("alpha"), carol).await;

        // when (操作):
        let summaries = registry.list().await;

        // then (期待する結果):
        assert_eq!(
            summaries,
            vec![
                RoomSummary {
                    id: room_id("alpha"),
                    member_count: 2,
                    created_at: Timestamp::new(42),
                },
                RoomSummary {
                    id: room_id("zeta"),
                    member_count: 1,
                    created_at: Timestamp::new(42),
                },
            ]
        );
    }
}
