//! UseCase errors

use thiserror::Error;

use crate::domain::{RepositoryError, RoomId, ShapeId, UserId};

/// ルーム参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error("user {user_id} is not a member of room {room_id}")]
    NotAuthorized { user_id: UserId, room_id: RoomId },

    /// メンバーシップの確認自体に失敗した（参加は拒否される）
    #[error("membership lookup failed: {0}")]
    MembershipLookup(RepositoryError),

    #[error("could not load canvas: {0}")]
    LoadCanvas(RepositoryError),
}

/// 図形保存のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawShapeError {
    #[error("shape {0} already exists")]
    Duplicate(ShapeId),

    #[error("could not persist shape: {0}")]
    Storage(RepositoryError),
}
