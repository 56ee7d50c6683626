//! Bearer token lookup for authenticated operations.

use std::sync::RwLock;

use reqwest::header::{COOKIE, HeaderMap};

use crate::cache::{rw_read, rw_write};

/// Name of the cookie that carries the session's bearer token.
pub const AUTH_COOKIE: &str = "auth_token";

const SOURCE: &str = "rpc::auth";

/// Whether an outbound call carried credentials.
///
/// A required-but-missing token does not stop the call; the backend is
/// expected to reject it. Callers branch on this instead of reading logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NotRequired,
    Attached,
    Missing,
}

impl AuthState {
    pub fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Supplies the bearer token when the inbound request does not carry one.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// No ambient credentials; only inbound cookies are consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSession;

impl TokenSource for NoSession {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Token held for the lifetime of one client session, set after login.
#[derive(Debug, Default)]
pub struct SessionToken {
    token: RwLock<Option<String>>,
}

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *rw_write(&self.token, SOURCE, "set_token") = Some(token.into());
    }

    pub fn clear(&self) {
        *rw_write(&self.token, SOURCE, "clear_token") = None;
    }
}

impl TokenSource for SessionToken {
    fn bearer_token(&self) -> Option<String> {
        rw_read(&self.token, SOURCE, "bearer_token").clone()
    }
}

/// Extracts the [`AUTH_COOKIE`] value from every `Cookie` header present.
pub fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == AUTH_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|token| !token.is_empty())
}
