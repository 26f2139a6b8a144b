//! Domain errors

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("'{0}' is not a valid UUID")]
    InvalidUuid(String),

    #[error("nil UUID is not a valid identifier")]
    NilUuid,
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 同じ ID のレコードが既に存在する
    #[error("record '{0}' already exists")]
    Conflict(String),

    /// 対象のレコードが存在しない（影響行数 0）
    #[error("record '{0}' not found")]
    NotFound(String),

    /// ストレージ層の障害
    #[error("storage failure: {0}")]
    Storage(String),
}

/// クレデンシャル検証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Cookie が存在しない
    #[error("credential cookie is missing")]
    Missing,

    #[error("credential is malformed: {0}")]
    Malformed(String),

    #[error("credential signature does not verify")]
    BadSignature,

    #[error("credential has expired")]
    Expired,

    /// HMAC 以外のアルゴリズムで署名されている
    #[error("credential is signed with a non-HMAC algorithm: {0}")]
    WrongAlgorithm(String),

    /// subject が UUID ではない
    #[error("credential subject '{0}' is not a valid user id")]
    InvalidSubject(String),
}
