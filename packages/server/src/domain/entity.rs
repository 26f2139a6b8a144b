//! Entities

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_object::{RoomId, ShapeId, Timestamp, UserId};

/// 検証済みクレデンシャルから得られる利用者
///
/// セッションの生存期間中は変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub name: String,
}

impl Principal {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// 永続化された描画プリミティブ
///
/// `id` はクライアントが生成したものをそのまま採用する（楽観的 UI）。
/// `payload` はクライアントが送った図形オブジェクトそのもの。
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    pub room_id: RoomId,
    pub creator_id: UserId,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

/// チャットメッセージの永続化レコード
///
/// `body` はクライアントが送った JSON をそのまま保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRecord {
    pub id: Uuid,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub body: serde_json::Value,
    pub created_at: Timestamp,
}

/// ルーム内での役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Creator,
    Admin,
    Member,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Creator => "creator",
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "creator" => Some(MembershipRole::Creator),
            "admin" => Some(MembershipRole::Admin),
            "member" => Some(MembershipRole::Member),
            _ => None,
        }
    }
}

/// ルームのメンバーシップ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub role: MembershipRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_role_round_trips_through_text() {
        // テスト項目: 役割の文字列表現から元の値に戻せる
        // given (前提条件):
        let roles = [
            MembershipRole::Creator,
            MembershipRole::Admin,
            MembershipRole::Member,
        ];

        // when (操作) / then (期待する結果):
        for role in roles {
            assert_eq!(MembershipRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(MembershipRole::parse("owner"), None);
    }
}
