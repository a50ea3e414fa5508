use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header::COOKIE, request::Parts},
};

use crate::error::AppError;
use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "token";

/// The user behind the request's session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing session token".to_string()))?;

        let claims = state.auth.verify_token(&token).map_err(|e| {
            tracing::debug!("rejected session token: {}", e);
            AppError::Unauthorized("Invalid session token".to_string())
        })?;

        Ok(AuthUser { user_id: claims.sub })
    }
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn token_cookie(token: &str) -> HeaderValue {
    // tokens are url-safe base64, always a valid header value
    HeaderValue::from_str(&format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax"))
        .unwrap_or_else(|_| clear_token_cookie())
}

pub fn clear_token_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; HttpOnly; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=abc_123; lang=en"));

        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc_123"));
    }

    #[test]
    fn test_missing_token_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("tokenish=1"));

        assert_eq!(token_from_headers(&headers), None);
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
