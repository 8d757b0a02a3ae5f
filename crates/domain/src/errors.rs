//! Error types used throughout the data-access layer
//!
//! Two families live here:
//! - [`BackofficeError`]: configuration, storage and internal failures that
//!   surface while wiring the layer together.
//! - [`RequestError`]: the uniform failure signal of the request gateway.
//!   Every store maps it to a human-readable message with
//!   [`RequestError::user_message`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MSG_NO_ACCESS_TOKEN, MSG_SESSION_EXPIRED};

/// Main error type for the back-office data-access layer
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BackofficeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for back-office operations
pub type Result<T> = std::result::Result<T, BackofficeError>;

/// Errors raised by durable session storage backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read {key}: {message}")]
    Read { key: String, message: String },

    #[error("failed to write {key}: {message}")]
    Write { key: String, message: String },

    #[error("stored value for {key} is corrupt: {message}")]
    Corrupt { key: String, message: String },
}

impl From<StorageError> for BackofficeError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Classification of gateway failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestErrorKind {
    /// No token present; short-circuits before any network call
    Unauthenticated,
    /// The token's expiration claim is in the past (or the server said 401)
    SessionExpired,
    /// Transport-level failure, no response received
    NetworkFailure,
    /// Non-2xx status or envelope `success = false`
    ServerRejected,
    /// Body could not be parsed as expected
    MalformedResponse,
    /// A newer request superseded this one and it was aborted
    Cancelled,
    /// The request could not be built (unknown endpoint, bad body)
    InvalidRequest,
}

impl RequestErrorKind {
    /// Stable label for logs
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::SessionExpired => "session_expired",
            Self::NetworkFailure => "network_failure",
            Self::ServerRejected => "server_rejected",
            Self::MalformedResponse => "malformed_response",
            Self::Cancelled => "cancelled",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uniform failure returned by the request gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestError {
    pub kind: RequestErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_message: Option<String>,
}

impl RequestError {
    pub fn new(kind: RequestErrorKind) -> Self {
        Self { kind, http_status: None, server_message: None }
    }

    pub fn unauthenticated() -> Self {
        Self::new(RequestErrorKind::Unauthenticated)
    }

    pub fn session_expired() -> Self {
        Self::new(RequestErrorKind::SessionExpired)
    }

    pub fn cancelled() -> Self {
        Self::new(RequestErrorKind::Cancelled)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self { server_message: Some(message.into()), ..Self::new(RequestErrorKind::NetworkFailure) }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            server_message: Some(message.into()),
            ..Self::new(RequestErrorKind::MalformedResponse)
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self { server_message: Some(message.into()), ..Self::new(RequestErrorKind::InvalidRequest) }
    }

    /// Server refused the request, either at HTTP or envelope level
    pub fn rejected(http_status: Option<u16>, server_message: Option<String>) -> Self {
        Self { kind: RequestErrorKind::ServerRejected, http_status, server_message }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.kind, RequestErrorKind::Unauthenticated | RequestErrorKind::SessionExpired)
    }

    /// Message suitable for an error banner.
    ///
    /// Prefers the server-supplied message when one exists.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind {
            RequestErrorKind::Unauthenticated => MSG_NO_ACCESS_TOKEN.to_string(),
            RequestErrorKind::SessionExpired => MSG_SESSION_EXPIRED.to_string(),
            _ => match (&self.server_message, self.http_status) {
                (Some(message), _) if !message.trim().is_empty() => message.clone(),
                (_, Some(status)) => format!("Request failed with status {status}"),
                _ => match self.kind {
                    RequestErrorKind::NetworkFailure => "Network request failed".to_string(),
                    RequestErrorKind::MalformedResponse => {
                        "Unexpected response from server".to_string()
                    }
                    RequestErrorKind::Cancelled => "Request cancelled".to_string(),
                    RequestErrorKind::InvalidRequest => "Invalid request".to_string(),
                    _ => "Request failed".to_string(),
                },
            },
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} ({status}): {}", self.kind, self.user_message()),
            None => write!(f, "{}: {}", self.kind, self.user_message()),
        }
    }
}

impl std::error::Error for RequestError {}
