//! UseCase: チャットメッセージの永続化
//!
//! 本文はクライアントが送った JSON をそのまま保存する。

use std::sync::Arc;

use kokuban_shared::time::Clock;
use uuid::Uuid;

use crate::domain::{ChatRecord, ChatRepository, Principal, RepositoryError, RoomId, Timestamp};

/// チャット送信のユースケース
pub struct SendChatUseCase {
    chats: Arc<dyn ChatRepository>,
    clock: Arc<dyn Clock>,
}

impl SendChatUseCase {
    pub fn new(chats: Arc<dyn ChatRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { chats, clock }
    }

    /// メッセージを追記し、保存したレコードを返す
    pub async fn execute(
        &self,
        principal: &Principal,
        room_id: RoomId,
        body: serde_json::Value,
    ) -> Result<ChatRecord, RepositoryError> {
        let record = ChatRecord {
            id: Uuid::new_v4(),
            room_id,
            user_id: principal.id,
            body,
            created_at: Timestamp::new(self.clock.now_millis()),
        };
        self.chats.append(record.clone()).await?;
        Ok(record)
    }
}
