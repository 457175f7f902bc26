//! Session and authorization helpers.
//!
//! Authorization is deliberately thin: the session cookie holds the caller's
//! Slack id in plaintext and its presence is the proof of authentication.
//! Ban enforcement happens at login and in the bot commands only; ordinary
//! API routes trust the cookie once it exists.

use std::path::Path;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "slack_user_id";

/// Session lifetime: 7 days.
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// An authenticated session: the Slack user id from the cookie.
#[derive(Debug, Clone)]
pub struct Session(pub String);

/// Like [`Session`] but never rejects; used by endpoints that answer
/// `authenticated: false` instead of 401.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<String>);

fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let name = parts.next()?;
        if name == SESSION_COOKIE {
            let value = parts.next().unwrap_or("");
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_headers(&parts.headers)
            .map(Session)
            .ok_or(AppError::NotAuthenticated)
    }
}

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(session_from_headers(&parts.headers)))
    }
}

/// Set-Cookie value establishing a session.
pub fn session_cookie(slack_user_id: &str) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, slack_user_id, SESSION_MAX_AGE_SECS
    )
}

/// Set-Cookie value clearing the session.
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Check the static admin-id config resource for membership. Any fetch or
/// parse failure is treated as non-admin.
pub async fn is_admin(http: &reqwest::Client, admin_config_url: &str, slack_user_id: &str) -> bool {
    let response = match http.get(admin_config_url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::error!("Admin config fetch returned {}", response.status());
            return false;
        }
        Err(err) => {
            tracing::error!("Error fetching admin config: {}", err);
            return false;
        }
    };

    let data: serde_json::Value = match response.json().await {
        Ok(data) => data,
        Err(err) => {
            tracing::error!("Error parsing admin config: {}", err);
            return false;
        }
    };

    data["admin-slack-ids"]
        .as_array()
        .map(|ids| ids.iter().any(|id| id.as_str() == Some(slack_user_id)))
        .unwrap_or(false)
}

/// Check the signup allow-list file for membership. A missing or malformed
/// file denies everyone.
pub async fn is_allow_listed(path: &Path, slack_user_id: &str) -> bool {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!("Allowed members file not readable: {}", err);
            return false;
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(allowed) => allowed.iter().any(|id| id == slack_user_id),
        Err(err) => {
            tracing::error!("Error parsing allowed members list: {}", err);
            false
        }
    }
}

/// Constant-time comparison for the demo invite code.
pub fn invite_code_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_parsed_from_cookie_header() {
        let headers = headers_with_cookie("slack_user_id=U123");
        assert_eq!(session_from_headers(&headers), Some("U123".to_string()));
    }

    #[test]
    fn test_session_parsed_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; slack_user_id=U456; lang=en");
        assert_eq!(session_from_headers(&headers), Some("U456".to_string()));
    }

    #[test]
    fn test_empty_or_missing_cookie_yields_no_session() {
        let headers = headers_with_cookie("slack_user_id=");
        assert_eq!(session_from_headers(&headers), None);
        assert_eq!(session_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_invite_code_comparison() {
        assert!(invite_code_matches("LODGEDEMO", "LODGEDEMO"));
        assert!(!invite_code_matches("LODGEDEMO", "LODGEDEM0"));
        assert!(!invite_code_matches("", "LODGEDEMO"));
    }
}
