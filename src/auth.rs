//! Admin authorization.
//!
//! Admin-only operations take an [`AdminContext`] argument. Holding one is
//! the proof that the caller was authorized; the web layer builds it from a
//! bearer token, the CLI builds it locally.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::types::MarketError;

/// An authorized administrative caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    actor: String,
}

impl AdminContext {
    /// Check a presented token against the configured admin secret.
    pub fn authenticate(presented: &str, expected: &SecretString) -> Result<Self, MarketError> {
        let expected = expected.expose_secret();
        if expected.is_empty() || !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            return Err(MarketError::Unauthorized);
        }
        Ok(Self {
            actor: "admin".to_string(),
        })
    }

    /// Context for maintenance commands run on the host itself.
    pub fn local(actor: &str) -> Self {
        Self {
            actor: format!("local:{actor}"),
        }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }
}

impl fmt::Display for AdminContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.actor)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Alternative to a bearer token for clients that can't set `Authorization`.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Pull a token out of `Authorization: Bearer <t>` or `X-Admin-Token: <t>`.
pub fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<&str> {
    if let Some(value) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim());
        }
    }
    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    #[test]
    fn test_authenticate_matching_token() {
        let ctx = AdminContext::authenticate("hunter2", &secret("hunter2")).unwrap();
        assert_eq!(ctx.actor(), "admin");
    }

    #[test]
    fn test_authenticate_rejects_wrong_or_empty() {
        assert!(matches!(
            AdminContext::authenticate("hunter3", &secret("hunter2")),
            Err(MarketError::Unauthorized)
        ));
        assert!(AdminContext::authenticate("hunter", &secret("hunter2")).is_err());
        assert!(AdminContext::authenticate("", &secret("")).is_err());
    }

    #[test]
    fn test_local_context() {
        assert_eq!(AdminContext::local("seed").to_string(), "local:seed");
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert("x-admin-token", HeaderValue::from_static("abc"));
        assert_eq!(token_from_headers(&headers), Some("abc"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer xyz"),
        );
        assert_eq!(token_from_headers(&headers), Some("xyz"));
    }
}
