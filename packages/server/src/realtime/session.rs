//! Session: 1 接続ぶんの実行時状態
//!
//! 状態とルーム ID は常に一緒に変わるため、`Joined` がルーム ID を持つ
//! 1 つの enum として 1 つの RwLock で守る。

use tokio::sync::RwLock;

use crate::domain::{Principal, RoomId, SessionId};

use super::outbound::Outbound;

/// 接続の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Joined(RoomId),
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    principal: Principal,
    state: RwLock<SessionState>,
    outbound: Outbound,
}

impl Session {
    pub fn new(principal: Principal, outbound: Outbound) -> Self {
        Self {
            id: SessionId::generate(),
            principal,
            state: RwLock::new(SessionState::Connected),
            outbound,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// 参加中のルーム
    pub async fn room_id(&self) -> Option<RoomId> {
        match *self.state.read().await {
            SessionState::Joined(room_id) => Some(room_id),
            SessionState::Connected => None,
        }
    }

    /// `Connected` → `Joined(room_id)`。既に参加中なら何もせず `false`
    pub async fn enter(&self, room_id: RoomId) -> bool {
        let mut state = self.state.write().await;
        match *state {
            SessionState::Connected => {
                *state = SessionState::Joined(room_id);
                true
            }
            SessionState::Joined(_) => false,
        }
    }

    /// `Joined` → `Connected`。抜けたルームを返す
    pub async fn leave(&self) -> Option<RoomId> {
        let mut state = self.state.write().await;
        match std::mem::replace(&mut *state, SessionState::Connected) {
            SessionState::Joined(room_id) => Some(room_id),
            SessionState::Connected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::realtime::outbound::outbound_channel;
    use uuid::Uuid;

    fn session() -> Session {
        let (outbound, _receiver) = outbound_channel(4);
        Session::new(Principal::new(UserId::new(Uuid::new_v4()), "alice"), outbound)
    }

    #[tokio::test]
    async fn test_new_session_is_connected() {
        // テスト項目: 新しいセッションは Connected でルームを持たない
        // given (前提条件):
        let session = session();

        // when (操作):
        let state = session.state().await;

        // then (期待する結果):
        assert_eq!(state, SessionState::Connected);
        assert_eq!(session.room_id().await, None);
    }

    #[tokio::test]
    async fn test_enter_twice_keeps_first_room() {
        // テスト項目: 参加中に再度 enter しても状態は変わらない
        // given (前提条件):
        let session = session();
        let first = RoomId::new(Uuid::new_v4());
        let second = RoomId::new(Uuid::new_v4());

        // when (操作):
        let entered = session.enter(first).await;
        let entered_again = session.enter(second).await;

        // then (期待する結果):
        assert!(entered);
        assert!(!entered_again);
        assert_eq!(session.state().await, SessionState::Joined(first));
    }

    #[tokio::test]
    async fn test_leave_returns_room_and_resets_state() {
        // テスト項目: leave で Connected に戻り、抜けたルームが返る
        // given (前提条件):
        let session = session();
        let room = RoomId::new(Uuid::new_v4());
        session.enter(room).await;

        // when (操作):
        let left = session.leave().await;
        let left_again = session.leave().await;

        // then (期待する結果):
        assert_eq!(left, Some(room));
        assert_eq!(left_again, None);
        assert_eq!(session.room_id().await, None);
    }
}
