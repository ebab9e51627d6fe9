//! The `jwt` session cookie.

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use jiff::SignedDuration;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "jwt";

const ATTRIBUTES: &str = "HttpOnly; Secure; SameSite=None; Path=/";

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, ttl: SignedDuration) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; {ATTRIBUTES}; Max-Age={}",
        ttl.as_secs()
    ))
    .map_err(|e| ApiError::Internal(format!("invalid session cookie: {e}")))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("jwt=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0")
}

/// The session token from the request's `Cookie` headers, if any.
pub fn read_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
