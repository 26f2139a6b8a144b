//! Repository implementations
//!
//! - `inmemory`: プロセス内のストア（開発・テスト用）
//! - `sqlite`: sqlx による SQLite 永続化

pub mod inmemory;
pub mod sqlite;

use std::sync::Arc;

pub use inmemory::{InMemoryChatRepository, InMemoryMembershipRepository, InMemoryShapeRepository};
pub use sqlite::{
    DbError, SqliteChatRepository, SqliteMembershipRepository, SqliteShapeRepository, SqliteStore,
};

use crate::domain::{ChatRepository, MembershipRepository, ShapeRepository};

/// コアが依存する 3 つのストアの組
#[derive(Clone)]
pub struct Stores {
    pub shapes: Arc<dyn ShapeRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub chats: Arc<dyn ChatRepository>,
}

impl Stores {
    /// プロセス内のストア
    pub fn in_memory() -> Self {
        Self {
            shapes: Arc::new(InMemoryShapeRepository::new()),
            memberships: Arc::new(InMemoryMembershipRepository::new()),
            chats: Arc::new(InMemoryChatRepository::new()),
        }
    }

    /// 1 つの SQLite プールを共有するストア
    pub fn sqlite(store: &SqliteStore) -> Self {
        Self {
            shapes: Arc::new(store.shapes()),
            memberships: Arc::new(store.memberships()),
            chats: Arc::new(store.chats()),
        }
    }
}
