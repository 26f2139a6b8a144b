//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ストア呼び出しはデータベースでブロックし得るが、セッションのタスクから
//! デッドロックなしに呼び出せることを前提とする。

use async_trait::async_trait;

use super::{ChatRecord, Membership, RepositoryError, RoomId, Shape, ShapeId, UserId};

/// 図形ストア
///
/// キャンバス再生の唯一の正となるデータ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShapeRepository: Send + Sync {
    /// 図形を永続化する。同じ ID が既に存在する場合は `Conflict`
    async fn create_shape(&self, shape: Shape) -> Result<(), RepositoryError>;

    /// ルームの図形を作成順（昇順）で取得する。空でもエラーではない
    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Shape>, RepositoryError>;

    /// 図形を削除する。影響行数 0 の場合は `NotFound`
    async fn delete_shape(&self, shape_id: ShapeId) -> Result<(), RepositoryError>;

    /// ルームの図形を全て削除する（冪等）。削除件数を返す
    async fn delete_by_room(&self, room_id: RoomId) -> Result<u64, RepositoryError>;
}

/// メンバーシップストア
///
/// コアからは読み取り専用。書き込みは REST 側の責務だが、
/// シードとテストのために `add_member` を提供する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// ユーザーがルームのメンバーかどうか
    async fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, RepositoryError>;

    /// メンバーを追加する（既存の場合は役割を上書き）
    async fn add_member(&self, membership: Membership) -> Result<(), RepositoryError>;
}

/// チャットメッセージの永続ログ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// メッセージを追記する
    async fn append(&self, record: ChatRecord) -> Result<(), RepositoryError>;

    /// ルームの直近 `limit` 件を時系列順で取得する
    async fn list_by_room(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<ChatRecord>, RepositoryError>;
}
