use std::fmt;

use hadith_wire::json::ErrorBody;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Status reported for failures that never produced an HTTP response.
pub const NETWORK_STATUS: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection, DNS, TLS, or timeout failure. Status is always 0.
    Network,
    /// The backend answered with a non-success status.
    HttpStatus,
    /// The body was empty or malformed where a message was expected.
    Decode,
    /// The request could not be built (bad URL, unencodable message).
    Request,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Network => "network error",
            Self::HttpStatus => "http error",
            Self::Decode => "decode error",
            Self::Request => "request error",
        })
    }
}

/// The single error type surfaced by the remote-call layer.
#[derive(Debug, Clone, Error)]
#[error("{kind} (status {status}): {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub message: String,
    pub trace_id: Option<String>,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: NETWORK_STATUS,
            message: message.into(),
            trace_id: None,
            details: None,
        }
    }

    pub fn decode(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            status: status.as_u16(),
            message: message.into(),
            trace_id: None,
            details: None,
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Request,
            status: NETWORK_STATUS,
            message: message.into(),
            trace_id: None,
            details: None,
        }
    }

    /// Builds an error from a non-success response body.
    ///
    /// The message is the nested `error.message`, else the top-level
    /// `message`, else the status line's reason phrase.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let details = serde_json::from_slice::<Value>(body).ok();
        let envelope = details
            .as_ref()
            .and_then(|value| serde_json::from_value::<ErrorBody>(value.clone()).ok());

        let message = envelope
            .as_ref()
            .and_then(ErrorBody::preferred_message)
            .map(str::to_string)
            .unwrap_or_else(|| status_text(status));
        let trace_id = envelope
            .as_ref()
            .and_then(ErrorBody::trace_id)
            .map(str::to_string);

        Self {
            kind: ApiErrorKind::HttpStatus,
            status: status.as_u16(),
            message,
            trace_id,
            details,
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind == ApiErrorKind::Network
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("request timed out: {err}"))
        } else if err.is_builder() {
            Self::request(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
