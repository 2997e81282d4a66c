//! API error types for the Atlassian gateway.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Stable, serializable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ConfigurationError,
    InputError,
    AuthenticationFailed,
    NotFound,
    InvalidRequest,
    RateLimited,
    ServiceUnavailable,
    NetworkError,
    Timeout,
    MalformedResponse,
}

/// Errors that can occur when interacting with Jira or Confluence.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Credentials rejected or access denied (401/403).
    #[error("Authentication failed (HTTP {status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    /// Resource not found. Carries the identifier that was looked up.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The service rejected the request as invalid, or local validation failed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        status: Option<u16>,
        message: String,
    },

    /// Rate limited, with the server's `Retry-After` hint if one was sent.
    #[error("Rate limited{}", retry_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Server-side failure (5xx).
    #[error("Service unavailable (HTTP {status}): {message}")]
    ServiceUnavailable { status: u16, message: String },

    /// Transport-level failure.
    ///
    /// `pre_send` is set when the connection was never established, so the
    /// request cannot have reached the service.
    #[error("Network error: {message}")]
    Network { message: String, pre_send: bool },

    /// The exchange exceeded its time limit.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A successful response whose body did not have the expected shape.
    #[error("Invalid API response: {0}")]
    MalformedResponse(String),
}

/// Serializable error details, written to stderr on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    /// Plain-language explanation and next step, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

fn retry_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(": retry after {}s", delay.as_secs()),
        None => String::new(),
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    ///
    /// `resource` names what was requested and is used for `NotFound`;
    /// `message` is the remote-supplied detail.
    pub fn from_status(
        status: StatusCode,
        resource: &str,
        message: &str,
        retry_after: Option<Duration>,
    ) -> Self {
        let code = status.as_u16();
        match code {
            401 | 403 => ApiError::AuthenticationFailed {
                status: code,
                message: message.to_string(),
            },
            404 => ApiError::NotFound(resource.to_string()),
            429 => ApiError::RateLimited { retry_after },
            500..=599 => ApiError::ServiceUnavailable {
                status: code,
                message: message.to_string(),
            },
            _ => ApiError::InvalidRequest {
                status: Some(code),
                message: message.to_string(),
            },
        }
    }

    /// Create a local validation failure that never reached the network.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidRequest {
            status: None,
            message: message.into(),
        }
    }

    /// The error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            ApiError::Network { .. } => ErrorKind::NetworkError,
            ApiError::Timeout(_) => ErrorKind::Timeout,
            ApiError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    /// The HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthenticationFailed { status, .. }
            | ApiError::ServiceUnavailable { status, .. } => Some(*status),
            ApiError::InvalidRequest { status, .. } => *status,
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// The server-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether the failure is expected to clear up on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. }
                | ApiError::ServiceUnavailable { .. }
                | ApiError::Network { .. }
                | ApiError::Timeout(_)
        )
    }

    /// Structured form for the error channel.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            status: self.status(),
            message: self.to_string(),
            retry_after_secs: self.retry_after().map(|d| d.as_secs()),
            hint: None,
        }
    }

    /// Whether resending cannot duplicate work on the service.
    ///
    /// True only when the request was refused before processing.
    pub fn is_safe_to_resend(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. } | ApiError::Network { pre_send: true, .. }
        )
    }
}
