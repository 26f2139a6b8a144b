//! Cookie からクレデンシャルを取り出す

use axum::http::{HeaderMap, header::COOKIE};

use super::jwt::CREDENTIAL_COOKIE;

/// `Cookie` ヘッダ群から名前付き Cookie の値を探す
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// クレデンシャル Cookie（`token`）の値を取り出す
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, CREDENTIAL_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_credential_found_among_other_cookies() {
        // テスト項目: 複数の Cookie の中から token を取り出せる
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; token=abc.def.ghi; lang=ja"),
        );

        // when (操作):
        let token = credential_from_headers(&headers);

        // then (期待する結果):
        assert_eq!(token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_credential_across_multiple_cookie_headers() {
        // テスト項目: Cookie ヘッダが複数あっても token を見つけられる
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("token=xyz"));

        // when (操作):
        let token = credential_from_headers(&headers);

        // then (期待する結果):
        assert_eq!(token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_missing_or_empty_credential() {
        // テスト項目: token が無い、または空の場合は None
        // given (前提条件):
        let empty = HeaderMap::new();
        let mut blank = HeaderMap::new();
        blank.insert(COOKIE, HeaderValue::from_static("token=; other=1"));

        // when (操作) / then (期待する結果):
        assert_eq!(credential_from_headers(&empty), None);
        assert_eq!(credential_from_headers(&blank), None);
    }
}
