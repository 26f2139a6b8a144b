//! InMemory Chat Repository 実装

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ChatRecord, ChatRepository, RepositoryError, RoomId};

#[derive(Default)]
pub struct InMemoryChatRepository {
    records: RwLock<Vec<ChatRecord>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn append(&self, record: ChatRecord) -> Result<(), RepositoryError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list_by_room(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<ChatRecord>, RepositoryError> {
        let records = self.records.read().await;
        let in_room: Vec<&ChatRecord> = records.iter().filter(|r| r.room_id == room_id).collect();
        let skip = in_room.len().saturating_sub(limit);
        Ok(in_room.into_iter().skip(skip).cloned().collect())
    }
}
