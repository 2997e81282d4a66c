//! Configuration management for the gateway.
//!
//! Credentials come from the environment only. Tuning for timeouts, retries
//! and page sizes may additionally come from an optional TOML settings file.

mod settings;

pub use settings::{HttpSettings, SearchSettings, Settings, MAX_PAGE_SIZE};

use thiserror::Error;

/// Environment variable holding the account email.
pub const EMAIL_VAR: &str = "ATLASSIAN_EMAIL";

/// Environment variable holding the API token.
pub const TOKEN_VAR: &str = "ATLASSIAN_API_TOKEN";

/// Environment variable holding the site base URL.
pub const BASE_URL_VAR: &str = "ATLASSIAN_BASE_URL";

/// Environment variable overriding the per-request timeout in seconds.
pub const TIMEOUT_VAR: &str = "ATLASSIAN_TIMEOUT";

/// Environment variable pointing at an alternative settings file.
pub const SETTINGS_PATH_VAR: &str = "ATLGATE_CONFIG";

/// Site used when `ATLASSIAN_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://lululemon.atlassian.net";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required environment variables are unset or empty.
    #[error("Missing required Atlassian env vars: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),

    /// An environment variable is set but cannot be used.
    #[error("Invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    /// The settings file exists but could not be read.
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The settings file is not valid TOML for the expected shape.
    #[error("Failed to parse settings file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value failed validation.
    #[error("{0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Raw account values as read from the environment.
///
/// Nothing here is validated beyond presence; [`crate::api::Credentials`]
/// does the format checks.
#[derive(Clone)]
pub struct Account {
    /// The site base URL.
    pub base_url: String,
    /// The account email.
    pub email: String,
    /// The API token.
    pub token: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fully loaded configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Account values from the environment.
    pub account: Account,
    /// Tuning settings from the settings file and environment overrides.
    pub settings: Settings,
}

impl Config {
    /// Load configuration from the process environment and the settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or token is missing, an override is
    /// malformed, or the settings file cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let settings = match std::env::var(SETTINGS_PATH_VAR) {
            Ok(path) if !path.is_empty() => Settings::load_from(path.as_ref())?,
            _ => Settings::load()?,
        };
        Self::from_lookup(settings, |name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(mut settings: Settings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let email = read(EMAIL_VAR);
        let token = read(TOKEN_VAR);

        let mut missing = Vec::new();
        if email.is_none() {
            missing.push(EMAIL_VAR);
        }
        if token.is_none() {
            missing.push(TOKEN_VAR);
        }
        let (Some(email), Some(token)) = (email, token) else {
            return Err(ConfigError::MissingVars(missing));
        };

        if let Some(raw) = read(TIMEOUT_VAR) {
            settings.http.timeout_secs =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar {
                        name: TIMEOUT_VAR,
                        reason: e.to_string(),
                    })?;
        }
        settings.validate()?;

        let base_url = read(BASE_URL_VAR)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            account: Account {
                base_url,
                email,
                token,
            },
            settings,
        })
    }
}
