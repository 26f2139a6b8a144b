//! クレデンシャル関連の実装
//!
//! - `jwt`: HMAC 署名の JWT を検証する `CredentialVerifier` 実装
//! - `cookie`: リクエストヘッダからクレデンシャル Cookie を取り出す

pub mod cookie;
pub mod jwt;

pub use cookie::credential_from_headers;
pub use jwt::{CREDENTIAL_COOKIE, Claims, JwtVerifier, TOKEN_TTL_SECS};
