//! SQLite Membership Repository 実装

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::map_sqlx_error;
use crate::domain::{Membership, MembershipRepository, RepositoryError, RoomId, UserId};

pub struct SqliteMembershipRepository {
    pool: SqlitePool,
}

impl SqliteMembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for SqliteMembershipRepository {
    async fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM room_members WHERE user_id = ? AND room_id = ?",
        )
        .bind(user_id.to_string())
        .bind(room_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, room_id))?;

        Ok(count > 0)
    }

    async fn add_member(&self, membership: Membership) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO room_members (user_id, room_id, role)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, room_id) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(membership.user_id.to_string())
        .bind(membership.room_id.to_string())
        .bind(membership.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, membership.room_id))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MembershipRole;
    use crate::infrastructure::repository::sqlite::SqliteStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_membership_lookup() {
        // テスト項目: 追加したユーザーのみがそのルームのメンバーになる
        // given (前提条件):
        let store = SqliteStore::in_memory().await.unwrap();
        let repo = store.memberships();
        let user = UserId::new(Uuid::new_v4());
        let stranger = UserId::new(Uuid::new_v4());
        let room = RoomId::new(Uuid::new_v4());

        // when (操作):
        repo.add_member(Membership {
            user_id: user,
            room_id: room,
            role: MembershipRole::Creator,
        })
        .await
        .unwrap();

        // then (期待する結果):
        assert!(repo.is_member(user, room).await.unwrap());
        assert!(!repo.is_member(stranger, room).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_member_twice_updates_role() {
        // テスト項目: 同じメンバーの再追加はエラーにならず役割を上書きする
        // given (前提条件):
        let store = SqliteStore::in_memory().await.unwrap();
        let repo = store.memberships();
        let user = UserId::new(Uuid::new_v4());
        let room = RoomId::new(Uuid::new_v4());
        let membership = |role| Membership {
            user_id: user,
            room_id: room,
            role,
        };
        repo.add_member(membership(MembershipRole::Member))
            .await
            .unwrap();

        // when (操作):
        let result = repo.add_member(membership(MembershipRole::Admin)).await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        let role: String = sqlx::query_scalar("SELECT role FROM room_members")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(role, "admin");
    }
}
