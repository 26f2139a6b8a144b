//! Room Hub: ルームごとの直列化ループ
//!
//! ## 責務
//!
//! - メンバー（セッション）の登録・解除
//! - ブロードキャストの fan-out（送信者は除外、`UserLeft` のみ全員へ）
//! - 遅いコンシューマの退去（送信キューが満杯なら即座に外してキューを閉じる）
//! - 送信キューが既に閉じているメンバーは退出扱い（`UserLeft` を合成する）
//! - 定期的な統計ログ
//!
//! ## 設計ノート
//!
//! メンバーマップへの変更はループだけが行い、排他ロックを取る。
//! fan-out は共有ロックで走査する。ループはブロードキャスト用の送信側を
//! 弱参照でしか持たないため、`RoomHub` が破棄されると自然に終了する。

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use kokuban_shared::time::Clock;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::time::{Instant, interval_at};

use crate::config::Timings;
use crate::domain::{Principal, RoomId, SessionId};
use crate::infrastructure::dto::websocket::{BroadcastFrame, MessageKind};

use super::outbound::PushError;
use super::session::Session;

type Members = Arc<RwLock<HashMap<SessionId, Arc<Session>>>>;

/// 登録依頼。ループがメンバーマップに反映した時点で `done` に通知する
struct Registration {
    session: Arc<Session>,
    done: oneshot::Sender<()>,
}

/// ハブに投入されるブロードキャスト
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastPayload {
    pub kind: MessageKind,
    pub sender: Principal,
    /// 送信元セッション（fan-out から除外される）
    pub origin: SessionId,
    /// クライアントが送った本文
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("room hub has shut down")]
pub struct HubClosed;

/// キューの使用状況
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStat {
    pub len: usize,
    pub capacity: usize,
}

impl QueueStat {
    fn of<T>(tx: &mpsc::Sender<T>) -> Self {
        Self {
            len: tx.max_capacity() - tx.capacity(),
            capacity: tx.max_capacity(),
        }
    }
}

/// ハブの統計スナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSnapshot {
    pub room_id: RoomId,
    pub members: usize,
    pub broadcasts: u64,
    pub evictions: u64,
    pub broadcast_queue: QueueStat,
    pub register_queue: QueueStat,
    pub unregister_queue: QueueStat,
}

#[derive(Debug, Default)]
struct HubStats {
    broadcasts: AtomicU64,
    evictions: AtomicU64,
    /// 登録キューに入ったがまだメンバーマップに反映されていない数
    pending_registers: AtomicUsize,
}

/// ルームのハブへのハンドル
pub struct RoomHub {
    room_id: RoomId,
    members: Members,
    broadcast_tx: mpsc::Sender<BroadcastPayload>,
    register_tx: mpsc::Sender<Registration>,
    unregister_tx: mpsc::Sender<Arc<Session>>,
    stats: Arc<HubStats>,
}

impl RoomHub {
    /// ハブを作成し、直列化ループを起動する
    pub fn spawn(room_id: RoomId, timings: &Timings, clock: Arc<dyn Clock>) -> Arc<Self> {
        let (broadcast_tx, broadcast_rx) = mpsc::channel(timings.broadcast_capacity);
        let (register_tx, register_rx) = mpsc::channel(timings.register_capacity);
        let (unregister_tx, unregister_rx) = mpsc::channel(timings.unregister_capacity);
        let members: Members = Arc::new(RwLock::new(HashMap::new()));
        let stats = Arc::new(HubStats::default());

        let hub_loop = HubLoop {
            room_id,
            members: members.clone(),
            stats: stats.clone(),
            broadcast_rx,
            register_rx,
            unregister_rx,
            broadcast_tx: broadcast_tx.downgrade(),
            clock,
            stats_period: timings.stats_period,
        };
        tokio::spawn(hub_loop.run());

        tracing::info!(room_id = %room_id, "Room hub created");

        Arc::new(Self {
            room_id,
            members,
            broadcast_tx,
            register_tx,
            unregister_tx,
            stats,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// メンバー登録を依頼する（満杯ならログのみで `None`）
    ///
    /// 返した受信側は、ループが登録を反映した時点で完了する。
    /// それ以降に投入されたブロードキャストはこのセッションにも届く。
    pub fn register(&self, session: Arc<Session>) -> Option<oneshot::Receiver<()>> {
        let (done, registered) = oneshot::channel();
        self.stats.pending_registers.fetch_add(1, Ordering::AcqRel);
        match self.register_tx.try_send(Registration { session, done }) {
            Ok(()) => Some(registered),
            Err(e) => {
                self.stats.pending_registers.fetch_sub(1, Ordering::AcqRel);
                tracing::warn!(room_id = %self.room_id, "Register channel full or closed: {}", e);
                None
            }
        }
    }

    /// メンバー解除を依頼する（満杯ならログのみ）
    pub fn unregister(&self, session: Arc<Session>) {
        if let Err(e) = self.unregister_tx.try_send(session) {
            tracing::warn!(room_id = %self.room_id, "Unregister channel full or closed: {}", e);
        }
    }

    /// ブロードキャストを投入する。キューが空くまで待つ
    pub async fn broadcast(&self, payload: BroadcastPayload) -> Result<(), HubClosed> {
        self.broadcast_tx.send(payload).await.map_err(|_| HubClosed)
    }

    pub async fn member_count(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn contains(&self, session_id: SessionId) -> bool {
        self.members.read().await.contains_key(&session_id)
    }

    /// メンバーも登録待ちも無い
    pub async fn is_idle(&self) -> bool {
        self.stats.pending_registers.load(Ordering::Acquire) == 0
            && self.members.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            room_id: self.room_id,
            members: self.member_count().await,
            broadcasts: self.stats.broadcasts.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            broadcast_queue: QueueStat::of(&self.broadcast_tx),
            register_queue: QueueStat::of(&self.register_tx),
            unregister_queue: QueueStat::of(&self.unregister_tx),
        }
    }
}

struct HubLoop {
    room_id: RoomId,
    members: Members,
    stats: Arc<HubStats>,
    broadcast_rx: mpsc::Receiver<BroadcastPayload>,
    register_rx: mpsc::Receiver<Registration>,
    unregister_rx: mpsc::Receiver<Arc<Session>>,
    broadcast_tx: mpsc::WeakSender<BroadcastPayload>,
    clock: Arc<dyn Clock>,
    stats_period: Duration,
}

impl HubLoop {
    async fn run(mut self) {
        let mut ticker = interval_at(Instant::now() + self.stats_period, self.stats_period);

        loop {
            tokio::select! {
                Some(registration) = self.register_rx.recv() => self.on_register(registration).await,
                Some(session) = self.unregister_rx.recv() => self.on_unregister(session).await,
                payload = self.broadcast_rx.recv() => match payload {
                    Some(payload) => self.fan_out(payload).await,
                    None => break,
                },
                _ = ticker.tick() => self.log_stats().await,
            }
        }

        tracing::info!(room_id = %self.room_id, "Room hub loop stopped");
    }

    async fn on_register(&self, registration: Registration) {
        let Registration { session, done } = registration;
        let principal = session.principal().clone();
        let session_id = session.id();
        self.members.write().await.insert(session_id, session);
        self.stats.pending_registers.fetch_sub(1, Ordering::AcqRel);
        // 依頼側が待っていなくてもよい
        let _ = done.send(());
        tracing::info!(
            room_id = %self.room_id,
            session_id = %session_id,
            "User {} ({}) joined room",
            principal.id,
            principal.name
        );
    }

    async fn on_unregister(&self, session: Arc<Session>) {
        let removed = self.members.write().await.remove(&session.id()).is_some();
        if !removed {
            return;
        }

        self.announce_left(&session);
    }

    /// 退出を記録し、残りのメンバーへの `UserLeft` を投入する
    fn announce_left(&self, session: &Session) {
        let principal = session.principal().clone();
        tracing::info!(
            room_id = %self.room_id,
            session_id = %session.id(),
            "User {} ({}) left room",
            principal.id,
            principal.name
        );

        // ループ自身がブロードキャストキューで詰まらないよう別タスクで投入する
        let payload = BroadcastPayload {
            kind: MessageKind::UserLeft,
            body: json!({ "userID": principal.id }),
            sender: principal,
            origin: session.id(),
        };
        let weak = self.broadcast_tx.clone();
        tokio::spawn(async move {
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(payload).await;
            }
        });
    }

    async fn fan_out(&self, payload: BroadcastPayload) {
        let frame = BroadcastFrame {
            kind: payload.kind,
            sender: (&payload.sender).into(),
            content: &payload.body,
            timestamp: self.clock.now_secs(),
        };
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(room_id = %self.room_id, "Failed to serialize broadcast: {}", e);
                return;
            }
        };
        self.stats.broadcasts.fetch_add(1, Ordering::Relaxed);

        let mut slow: Vec<(SessionId, PushError)> = Vec::new();
        {
            let members = self.members.read().await;
            for (session_id, session) in members.iter() {
                if *session_id == payload.origin && payload.kind != MessageKind::UserLeft {
                    continue;
                }
                if let Err(e) = session.outbound().try_push(text.clone()) {
                    slow.push((*session_id, e));
                }
            }
        }

        if slow.is_empty() {
            return;
        }
        let mut members = self.members.write().await;
        for (session_id, reason) in slow {
            let Some(session) = members.remove(&session_id) else {
                continue;
            };
            match reason {
                // 切断処理中のセッション。解除依頼より先に気づいた場合もここで退出させる
                PushError::Closed => self.announce_left(&session),
                PushError::Full => {
                    session.outbound().close();
                    self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        room_id = %self.room_id,
                        session_id = %session_id,
                        user_id = %session.principal().id,
                        "Evicted slow consumer: {}",
                        reason
                    );
                }
            }
        }
    }

    async fn log_stats(&self) {
        let members = self.members.read().await.len();
        tracing::info!(
            room_id = %self.room_id,
            "Users: {}, Broadcast queue: {}/{}, Register queue: {}/{}, Unregister queue: {}/{}",
            members,
            self.broadcast_rx.len(),
            self.broadcast_rx.max_capacity(),
            self.register_rx.len(),
            self.register_rx.max_capacity(),
            self.unregister_rx.len(),
            self.unregister_rx.max_capacity(),
        );
    }
}
