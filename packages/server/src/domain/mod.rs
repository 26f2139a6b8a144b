//! Domain layer: value objects, entities and the ports the core depends on.

pub mod auth;
pub mod entity;
pub mod error;
pub mod repository;
pub mod value_object;

pub use auth::CredentialVerifier;
pub use entity::{ChatRecord, Membership, MembershipRole, Principal, Shape};
pub use error::{AuthError, RepositoryError, ValueObjectError};
pub use repository::{ChatRepository, MembershipRepository, ShapeRepository};
pub use value_object::{RoomId, SessionId, ShapeId, Timestamp, UserId};

#[cfg(test)]
pub use repository::{MockChatRepository, MockMembershipRepository, MockShapeRepository};
