//! Credential verification port

use super::{AuthError, Principal};

/// 接続時に提示されたクレデンシャルを検証する
///
/// 成功時に返す `Principal` の ID は有効な UUID であり、
/// トークンの subject と一致する。
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}
