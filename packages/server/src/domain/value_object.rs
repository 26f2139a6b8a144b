//! Value Objects
//!
//! 識別子は全て UUID を包んだ newtype として表現する。
//! 文字列からの変換はここで一度だけ検証し、以降の層では型で保証する。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

macro_rules! uuid_value_object {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an already validated UUID
            pub fn new(value: Uuid) -> Self {
                Self(value)
            }

            /// Parse from the textual UUID form used on the wire
            pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
                let uuid = Uuid::parse_str(value)
                    .map_err(|_| ValueObjectError::InvalidUuid(value.to_string()))?;
                if uuid.is_nil() {
                    return Err(ValueObjectError::NilUuid);
                }
                Ok(Self(uuid))
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_value_object!(
    /// ユーザー ID（クレデンシャルの subject）
    UserId
);

uuid_value_object!(
    /// ルーム ID
    RoomId
);

uuid_value_object!(
    /// 図形 ID（クライアントが生成し、サーバーはそのまま採用する）
    ShapeId
);

uuid_value_object!(
    /// 接続ごとに払い出されるセッション ID
    SessionId
);

impl SessionId {
    /// 新しいセッション ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Unix タイムスタンプ（UTC, ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
