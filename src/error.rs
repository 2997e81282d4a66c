//! Centralized error types for the gateway.
//!
//! Every failure a command can hit ends up as an [`AppError`], which knows
//! how to describe itself on the error channel.

use thiserror::Error;

use crate::api::{ApiError, ErrorKind, ErrorReport};
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// IO errors while reading input files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller input that cannot be used.
    #[error("{0}")]
    Input(String),
}

impl AppError {
    /// Create an input error.
    pub fn input(msg: impl Into<String>) -> Self {
        AppError::Input(msg.into())
    }

    /// The error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::ConfigurationError,
            AppError::Api(e) => e.kind(),
            AppError::Io(_) | AppError::Input(_) => ErrorKind::InputError,
        }
    }

    /// Structured form for the error channel, with a plain-language hint.
    pub fn report(&self) -> ErrorReport {
        let mut report = match self {
            AppError::Api(e) => e.report(),
            other => ErrorReport {
                kind: other.kind(),
                status: None,
                message: other.to_string(),
                retry_after_secs: None,
                hint: None,
            },
        };
        report.hint = Some(self.hint());
        report
    }

    /// The user message followed by the suggested action, if any.
    fn hint(&self) -> String {
        match self.suggested_action() {
            Some(action) => format!("{} {}", self.user_message(), action),
            None => self.user_message(),
        }
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(ConfigError::MissingVars(vars)) => format!(
                "Set {} before running this command.",
                vars.join(" and ")
            ),
            AppError::Config(ConfigError::ReadError(_)) => {
                "Could not read the settings file. Please check it is readable.".to_string()
            }
            AppError::Config(ConfigError::ParseError(_)) => {
                "Settings file is invalid. Please check the file format.".to_string()
            }
            AppError::Config(e) => format!("Configuration error: {}", e),
            AppError::Api(e) => match e {
                ApiError::AuthenticationFailed { .. } => {
                    "Authentication failed. Please check your email and API token.".to_string()
                }
                ApiError::NotFound(resource) => format!("'{}' was not found.", resource),
                ApiError::RateLimited { .. } => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServiceUnavailable { .. } => {
                    "Atlassian server error. Please try again later.".to_string()
                }
                ApiError::Network { .. } | ApiError::Timeout(_) => {
                    "Connection failed. Please check your internet connection.".to_string()
                }
                ApiError::MalformedResponse(_) => {
                    "Unexpected response from Atlassian. Please try again.".to_string()
                }
                ApiError::InvalidRequest { message, .. } => {
                    format!("Request rejected: {}", message)
                }
            },
            AppError::Io(_) => "A file could not be read. Please check the path.".to_string(),
            AppError::Input(msg) => msg.clone(),
        }
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::MissingVars(_)) => {
                Some("Export ATLASSIAN_EMAIL and ATLASSIAN_API_TOKEN.")
            }
            AppError::Api(ApiError::AuthenticationFailed { .. }) => Some(
                "Check your API token at https://id.atlassian.com/manage-profile/security/api-tokens",
            ),
            AppError::Api(ApiError::RateLimited { .. }) => Some("Wait a few seconds and retry."),
            AppError::Api(ApiError::Network { .. }) | AppError::Api(ApiError::Timeout(_)) => {
                Some("Check your internet connection and ATLASSIAN_BASE_URL.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::MissingVars(vec!["ATLASSIAN_EMAIL"]).into();
        assert!(matches!(app_err, AppError::Config(ConfigError::MissingVars(_))));
        assert_eq!(app_err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_app_error_from_api_error() {
        let app_err: AppError = ApiError::NotFound("12345678".into()).into();
        assert_eq!(app_err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_report_keeps_api_details() {
        let err = AppError::Api(ApiError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        });
        let report = err.report();
        assert_eq!(report.kind, ErrorKind::RateLimited);
        assert_eq!(report.status, Some(429));
        assert_eq!(report.retry_after_secs, Some(7));
    }

    #[test]
    fn test_report_for_input_error() {
        let report = AppError::input("--body-file not readable").report();
        assert_eq!(report.kind, ErrorKind::InputError);
        assert_eq!(report.status, None);
        assert_eq!(report.message, "--body-file not readable");
    }

    #[test]
    fn test_report_serializes_without_empty_fields() {
        let report = AppError::Config(ConfigError::MissingVars(vec!["ATLASSIAN_API_TOKEN"])).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "ConfigurationError",
                "message": "Missing required Atlassian env vars: ATLASSIAN_API_TOKEN",
                "hint": "Set ATLASSIAN_API_TOKEN before running this command. \
                         Export ATLASSIAN_EMAIL and ATLASSIAN_API_TOKEN."
            })
        );
    }

    #[test]
    fn test_report_hint_uses_user_message() {
        let report = AppError::Api(ApiError::NotFound("12345678".into())).report();
        assert_eq!(report.message, "Resource not found: 12345678");
        assert_eq!(report.hint.as_deref(), Some("'12345678' was not found."));
    }

    #[test]
    fn test_user_message_authentication() {
        let err = AppError::Api(ApiError::AuthenticationFailed {
            status: 401,
            message: "Unauthorized".into(),
        });
        let msg = err.user_message();
        assert!(msg.contains("email"));
        assert!(msg.contains("API token"));
    }

    #[test]
    fn test_user_message_not_found() {
        let err = AppError::Api(ApiError::NotFound("PROJ-123".to_string()));
        assert_eq!(err.user_message(), "'PROJ-123' was not found.");
    }

    #[test]
    fn test_user_message_missing_vars() {
        let err = AppError::Config(ConfigError::MissingVars(vec![
            "ATLASSIAN_EMAIL",
            "ATLASSIAN_API_TOKEN",
        ]));
        assert_eq!(
            err.user_message(),
            "Set ATLASSIAN_EMAIL and ATLASSIAN_API_TOKEN before running this command."
        );
    }

    #[test]
    fn test_suggested_action_unauthorized() {
        let err = AppError::Api(ApiError::AuthenticationFailed {
            status: 403,
            message: "Forbidden".into(),
        });
        assert!(err.suggested_action().unwrap().contains("api-tokens"));
    }

    #[test]
    fn test_suggested_action_none_for_not_found() {
        let err = AppError::Api(ApiError::NotFound("X".into()));
        assert!(err.suggested_action().is_none());
    }
}
