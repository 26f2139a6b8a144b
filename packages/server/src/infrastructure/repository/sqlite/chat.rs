//! SQLite Chat Repository 実装

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{corrupt, map_sqlx_error};
use crate::domain::{ChatRecord, ChatRepository, RepositoryError, RoomId, Timestamp, UserId};

type ChatRow = (String, String, String, String, i64);

pub struct SqliteChatRepository {
    pool: SqlitePool,
}

impl SqliteChatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: ChatRow) -> Result<ChatRecord, RepositoryError> {
    let (id, room_id, user_id, body, created_at) = row;
    Ok(ChatRecord {
        id: Uuid::parse_str(&id).map_err(|e| corrupt("chat_messages.id", e))?,
        room_id: RoomId::parse(&room_id).map_err(|e| corrupt("chat_messages.room_id", e))?,
        user_id: UserId::parse(&user_id).map_err(|e| corrupt("chat_messages.user_id", e))?,
        body: serde_json::from_str(&body).map_err(|e| corrupt("chat_messages.body", e))?,
        created_at: Timestamp::new(created_at),
    })
}

#[async_trait]
impl ChatRepository for SqliteChatRepository {
    async fn append(&self, record: ChatRecord) -> Result<(), RepositoryError> {
        let body = serde_json::to_string(&record.body)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, room_id, user_id, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.room_id.to_string())
        .bind(record.user_id.to_string())
        .bind(body)
        .bind(record.created_at.value())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, record.id))?;

        Ok(())
    }

    async fn list_by_room(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<ChatRecord>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT id, room_id, user_id, body, created_at
            FROM chat_messages
            WHERE room_id = ?
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(room_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, room_id))?;

        rows.reverse();
        rows.into_iter().map(record_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::sqlite::SqliteStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_by_room_returns_latest_in_chronological_order() {
        // テスト項目: 直近 limit 件が古い順に並んで返る
        // given (前提条件):
        let store = SqliteStore::in_memory().await.unwrap();
        let repo = store.chats();
        let room = RoomId::new(Uuid::new_v4());
        let user = UserId::new(Uuid::new_v4());
        for i in 0..4 {
            repo.append(ChatRecord {
                id: Uuid::new_v4(),
                room_id: room,
                user_id: user,
                body: json!({"text": format!("m{i}")}),
                created_at: Timestamp::new(1_000 + i),
            })
            .await
            .unwrap();
        }

        // when (操作):
        let records = repo.list_by_room(room, 3).await.unwrap();

        // then (期待する結果):
        let texts: Vec<_> = records.iter().map(|r| r.body["text"].clone()).collect();
        assert_eq!(texts, vec![json!("m1"), json!("m2"), json!("m3")]);
        assert!(records.iter().all(|r| r.user_id == user));
    }

    #[tokio::test]
    async fn test_list_by_room_for_empty_room() {
        // テスト項目: メッセージの無いルームは空の一覧
        // given (前提条件):
        let store = SqliteStore::in_memory().await.unwrap();
        let repo = store.chats();

        // when (操作):
        let records = repo
            .list_by_room(RoomId::new(Uuid::new_v4()), 10)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(records.is_empty());
    }
}
