//! Hub registry: ルーム ID → ハブの対応表と、空きハブの回収
//!
//! 取得・作成・回収はすべてレジストリのロック下で行う。回収はメンバーも
//! 登録待ちも無いハブだけを対象にするため、進行中のやりとりを妨げない。

use std::collections::HashMap;
use std::sync::Arc;

use kokuban_shared::time::Clock;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::config::Timings;
use crate::domain::RoomId;

use super::hub::{HubSnapshot, RoomHub};
use super::session::Session;

pub struct HubRegistry {
    hubs: RwLock<HashMap<RoomId, Arc<RoomHub>>>,
    timings: Timings,
    clock: Arc<dyn Clock>,
}

impl HubRegistry {
    pub fn new(timings: Timings, clock: Arc<dyn Clock>) -> Self {
        Self {
            hubs: RwLock::new(HashMap::new()),
            timings,
            clock,
        }
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// 既存のハブを返すか、新しく作ってループを起動する
    pub async fn get_or_create(&self, room_id: RoomId) -> Arc<RoomHub> {
        let mut hubs = self.hubs.write().await;
        hubs.entry(room_id)
            .or_insert_with(|| RoomHub::spawn(room_id, &self.timings, self.clock.clone()))
            .clone()
    }

    /// ハブを取得（または作成）し、同じロック区間でセッションの登録を依頼する
    ///
    /// 登録待ちのハブは回収されないため、参加直後のハブが消えることはない。
    /// 戻った時点で登録はハブに反映済みで、以降の配信はこのセッションにも届く。
    pub async fn join(&self, room_id: RoomId, session: Arc<Session>) -> Arc<RoomHub> {
        let (hub, registered) = {
            let mut hubs = self.hubs.write().await;
            let hub = hubs
                .entry(room_id)
                .or_insert_with(|| RoomHub::spawn(room_id, &self.timings, self.clock.clone()))
                .clone();
            let registered = hub.register(session);
            (hub, registered)
        };

        // 反映の待機はレジストリのロックを放してから行う
        if let Some(registered) = registered
            && registered.await.is_err()
        {
            tracing::warn!(room_id = %room_id, "Room hub stopped before registration");
        }
        hub
    }

    pub async fn get(&self, room_id: RoomId) -> Option<Arc<RoomHub>> {
        self.hubs.read().await.get(&room_id).cloned()
    }

    /// セッションをルームのハブから外す。ハブが無ければ何もしない
    pub async fn leave(&self, room_id: RoomId, session: Arc<Session>) {
        if let Some(hub) = self.get(room_id).await {
            hub.unregister(session);
        }
    }

    pub async fn len(&self) -> usize {
        self.hubs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.hubs.read().await.is_empty()
    }

    /// メンバーの居ないハブを破棄し、破棄した数を返す
    pub async fn reap_idle(&self) -> usize {
        let mut hubs = self.hubs.write().await;
        let mut idle = Vec::new();
        for (room_id, hub) in hubs.iter() {
            if hub.is_idle().await {
                idle.push(*room_id);
            }
        }
        for room_id in &idle {
            hubs.remove(room_id);
            tracing::info!(room_id = %room_id, "Reaped idle room hub");
        }
        idle.len()
    }

    /// 一定周期で `reap_idle` を呼ぶタスクを起動する
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = self.clone();
        let period = self.timings.reaper_period;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let reaped = registry.reap_idle().await;
                if reaped > 0 {
                    tracing::debug!("Reaper removed {} idle hub(s)", reaped);
                }
            }
        })
    }

    /// 全ハブの統計（ルーム ID 順）
    pub async fn snapshots(&self) -> Vec<HubSnapshot> {
        let hubs: Vec<Arc<RoomHub>> = self.hubs.read().await.values().cloned().collect();
        let mut snapshots = Vec::with_capacity(hubs.len());
        for hub in hubs {
            snapshots.push(hub.snapshot().await);
        }
        snapshots.sort_by_key(|s| s.room_id);
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Principal, UserId};
    use crate::realtime::outbound::outbound_channel;
    use kokuban_shared::time::SystemClock;
    use std::time::Duration;
    use uuid::Uuid;

    fn registry(timings: Timings) -> Arc<HubRegistry> {
        Arc::new(HubRegistry::new(timings, Arc::new(SystemClock)))
    }

    fn session() -> Arc<Session> {
        let (outbound, _receiver) = outbound_channel(8);
        Arc::new(Session::new(
            Principal::new(UserId::new(Uuid::new_v4()), "alice"),
            outbound,
        ))
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_hub() {
        // テスト項目: 同じルーム ID には同じハブが返る
        // given (前提条件):
        let registry = registry(Timings::default());
        let room = RoomId::new(Uuid::new_v4());

        // when (操作):
        let first = registry.get_or_create(room).await;
        let second = registry.get_or_create(room).await;

        // then (期待する結果):
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_does_not_create() {
        // テスト項目: get は存在しないハブを作らない
        // given (前提条件):
        let registry = registry(Timings::default());

        // when (操作):
        let hub = registry.get(RoomId::new(Uuid::new_v4())).await;

        // then (期待する結果):
        assert!(hub.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_reap_removes_only_empty_hubs() {
        // テスト項目: メンバーの居ないハブだけが回収され、再取得で新しいハブが作られる
        // given (前提条件):
        let registry = registry(Timings::default());
        let empty_room = RoomId::new(Uuid::new_v4());
        let busy_room = RoomId::new(Uuid::new_v4());
        let old_hub = registry.get_or_create(empty_room).await;
        let busy_hub = registry.join(busy_room, session()).await;

        // when (操作):
        let reaped = registry.reap_idle().await;

        // then (期待する結果):
        assert_eq!(reaped, 1);
        assert!(registry.get(empty_room).await.is_none());
        assert!(registry.get(busy_room).await.is_some());
        let new_hub = registry.get_or_create(empty_room).await;
        assert!(!Arc::ptr_eq(&old_hub, &new_hub));
        assert_eq!(busy_hub.room_id(), busy_room);
    }

    #[tokio::test]
    async fn test_join_returns_after_registration() {
        // テスト項目: join から戻った時点でセッションはハブのメンバーになっている
        // given (前提条件):
        let registry = registry(Timings::default());
        let room = RoomId::new(Uuid::new_v4());
        let alice = session();

        // when (操作):
        let hub = registry.join(room, alice.clone()).await;

        // then (期待する結果):
        assert!(hub.contains(alice.id()).await);
        assert!(!hub.is_idle().await);
    }

    #[tokio::test]
    async fn test_reaper_task_runs_periodically() {
        // テスト項目: 回収タスクが周期ごとに空のハブを消す
        // given (前提条件):
        let registry = registry(Timings {
            reaper_period: Duration::from_millis(20),
            ..Timings::default()
        });
        registry.get_or_create(RoomId::new(Uuid::new_v4())).await;

        // when (操作):
        let reaper = registry.spawn_reaper();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果):
        assert!(registry.is_empty().await);
        reaper.abort();
    }

    #[tokio::test]
    async fn test_snapshots_list_every_hub() {
        // テスト項目: 全ハブのスナップショットが取得できる
        // given (前提条件):
        let registry = registry(Timings::default());
        let rooms = [RoomId::new(Uuid::new_v4()), RoomId::new(Uuid::new_v4())];
        for room in rooms {
            registry.get_or_create(room).await;
        }

        // when (操作):
        let snapshots = registry.snapshots().await;

        // then (期待する結果):
        let mut expected = rooms.to_vec();
        expected.sort();
        let actual: Vec<RoomId> = snapshots.iter().map(|s| s.room_id).collect();
        assert_eq!(actual, expected);
        assert!(snapshots.iter().all(|s| s.members == 0));
    }
}
