//! InMemory Repository 実装
//!
//! ドメイン層が定義する Repository trait の具体的な実装。
//! `DATABASE_URL` が指定されていない場合とテストで使用します。

mod chat;
mod membership;
mod shape;

pub use chat::InMemoryChatRepository;
pub use membership::InMemoryMembershipRepository;
pub use shape::InMemoryShapeRepository;
