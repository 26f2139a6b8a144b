//! JWT を使った CredentialVerifier 実装
//!
//! ## 仕様
//!
//! - Cookie `token` に HMAC-SHA256 で署名された JWT が入る
//! - クレームは `user_id`（UUID 文字列）と `user_name`
//! - 有効期限は発行から 24 時間、クロックスキューの許容はなし
//! - HMAC 以外のアルゴリズムで署名されたトークンは拒否する

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, CredentialVerifier, Principal, UserId};

/// クレデンシャルを運ぶ Cookie の名前
pub const CREDENTIAL_COOKIE: &str = "token";

/// トークンの有効期間（秒）
pub const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// JWT クレーム
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub user_name: String,
    /// 発行時刻（Unix 秒）
    pub iat: u64,
    /// 有効期限（Unix 秒）
    pub exp: u64,
}

/// HMAC 共通鍵で JWT を発行・検証する
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtVerifier {
    /// 共通鍵から作成
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// `issued_at`（Unix 秒）を発行時刻として HS256 トークンを発行する
    pub fn issue(
        &self,
        principal: &Principal,
        issued_at: u64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            user_id: principal.id.to_string(),
            user_name: principal.name.clone(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if !matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::WrongAlgorithm(format!("{:?}", header.alg)));
        }

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(map_jwt_error)?;
        let user_id = UserId::parse(&data.claims.user_id)
            .map_err(|_| AuthError::InvalidSubject(data.claims.user_id.clone()))?;

        Ok(Principal::new(user_id, data.claims.user_name))
    }
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        ErrorKind::InvalidAlgorithm => AuthError::WrongAlgorithm(error.to_string()),
        _ => AuthError::Malformed(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kokuban_shared::time::{Clock, SystemClock};
    use uuid::Uuid;

    const SECRET: &[u8] = b"test-secret";

    fn now_secs() -> u64 {
        SystemClock.now_secs() as u64
    }

    fn alice() -> Principal {
        Principal::new(UserId::new(Uuid::new_v4()), "alice")
    }

    #[test]
    fn test_verify_issued_token() {
        // テスト項目: 発行したトークンを検証すると同じ Principal が得られる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET);
        let principal = alice();
        let token = verifier.issue(&principal, now_secs()).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Ok(principal));
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        // テスト項目: 別の鍵で署名されたトークンは BadSignature になる
        // given (前提条件):
        let issuer = JwtVerifier::new(b"another-secret");
        let verifier = JwtVerifier::new(SECRET);
        let token = issuer.issue(&alice(), now_secs()).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::BadSignature));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // テスト項目: 24 時間以上前に発行されたトークンは Expired になる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET);
        let issued_at = now_secs() - TOKEN_TTL_SECS - 60;
        let token = verifier.issue(&alice(), issued_at).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::Expired));
    }

    #[test]
    fn test_verify_rejects_non_hmac_algorithm() {
        // テスト項目: RS256 ヘッダのトークンは WrongAlgorithm になる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET);
        // {"alg":"RS256","typ":"JWT"}.{}.sig
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.e30.c2ln";

        // when (操作):
        let result = verifier.verify(token);

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::WrongAlgorithm(_))));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        // テスト項目: JWT の形をしていない文字列は Malformed になる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET);

        // when (操作):
        let result = verifier.verify("not-a-token");

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_verify_rejects_non_uuid_subject() {
        // テスト項目: user_id が UUID でないトークンは InvalidSubject になる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET);
        let issued_at = now_secs();
        let claims = Claims {
            user_id: "alice".to_string(),
            user_name: "alice".to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::InvalidSubject("alice".to_string())));
    }
}
