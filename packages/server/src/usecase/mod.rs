//! UseCase 層
//!
//! セッションのディスパッチャから呼ばれる、永続化を伴う処理をまとめる。
//! ブロードキャストはリアルタイム層（ハブ）の責務で、ここでは扱わない。

pub mod draw_shape;
pub mod error;
pub mod join_room;
pub mod remove_shape;
pub mod send_chat;

pub use draw_shape::DrawShapeUseCase;
pub use error::{DrawShapeError, JoinRoomError};
pub use join_room::JoinRoomUseCase;
pub use remove_shape::{RemoveOutcome, RemoveShapeUseCase};
pub use send_chat::SendChatUseCase;
