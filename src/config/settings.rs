//! Gateway tuning settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ConfigError, Result};

/// Largest page size either service accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Tuning settings, loaded from `config.toml` when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// HTTP exchange settings.
    pub http: HttpSettings,
    /// Search pagination settings.
    pub search: SearchSettings,
}

/// Timeout and retry settings for each HTTP exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpSettings {
    /// Wall-clock limit for one exchange, in seconds.
    pub timeout_secs: u64,
    /// Total attempts per exchange, including the first.
    pub max_attempts: u32,
    /// Backoff base delay in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for computed backoff delays in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchSettings {
    /// Items requested per page.
    pub page_size: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;

        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// The platform-specific settings path (`<config dir>/atlgate/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("atlgate").join("config.toml"))
    }

    /// Validate value ranges.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.http.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "http.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.search.page_size == 0 || self.search.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "search.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.http.timeout_secs, 30);
        assert_eq!(settings.http.max_attempts, 3);
        assert_eq!(settings.http.base_delay_ms, 1000);
        assert_eq!(settings.search.page_size, 50);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\nmax_attempts = 5\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.http.max_attempts, 5);
        assert_eq!(settings.http.timeout_secs, 30);
        assert_eq!(settings.search.page_size, 50);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http\nmax_attempts = ").unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_page_size_out_of_range_rejected() {
        let mut settings = Settings::default();
        settings.search.page_size = 500;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("search.page_size"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut settings = Settings::default();
        settings.http.max_attempts = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let settings = Settings::default();
        let toml_str = toml::to_string(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }
}
