//! InMemory Membership Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Membership, MembershipRepository, MembershipRole, RepositoryError, RoomId, UserId,
};

#[derive(Default)]
pub struct InMemoryMembershipRepository {
    members: RwLock<HashMap<(UserId, RoomId), MembershipRole>>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, RepositoryError> {
        let members = self.members.read().await;
        Ok(members.contains_key(&(user_id, room_id)))
    }

    async fn add_member(&self, membership: Membership) -> Result<(), RepositoryError> {
        let mut members = self.members.write().await;
        members.insert((membership.user_id, membership.room_id), membership.role);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_is_member_after_add() {
        // テスト項目: 追加したメンバーのみがメンバーとして判定される
        // given (前提条件):
        let repo = InMemoryMembershipRepository::new();
        let user = UserId::new(Uuid::new_v4());
        let room = RoomId::new(Uuid::new_v4());
        let other_room = RoomId::new(Uuid::new_v4());

        // when (操作):
        repo.add_member(Membership {
            user_id: user,
            room_id: room,
            role: MembershipRole::Member,
        })
        .await
        .unwrap();

        // then (期待する結果):
        assert!(repo.is_member(user, room).await.unwrap());
        assert!(!repo.is_member(user, other_room).await.unwrap());
    }
}
