//! Credential handling for the Atlassian APIs.
//!
//! Both Jira and Confluence Cloud accept Basic Auth built from the account
//! email and an API token, against one shared site URL.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Url;
use tracing::warn;

use crate::config::{Account, ConfigError};

/// Immutable credentials and site address for one invocation.
///
/// The raw token is encoded into the header value on construction and is
/// not retained.
#[derive(Clone)]
pub struct Credentials {
    /// The user's email address.
    email: String,
    /// The site base URL without a trailing slash.
    base_url: String,
    /// The Base64-encoded authorization header value.
    auth_header: String,
}

impl Credentials {
    /// Create credentials from email, API token and site base URL.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` if any value is empty, the
    /// email is not email-like, or the base URL is not an http(s) address.
    pub fn new(email: &str, token: &str, base_url: &str) -> Result<Self, ConfigError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ConfigError::ValidationError(
                "email cannot be empty".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(ConfigError::ValidationError(format!(
                "'{}' does not appear to be a valid email address",
                email
            )));
        }
        if token.is_empty() {
            return Err(ConfigError::ValidationError(
                "API token cannot be empty".to_string(),
            ));
        }

        let base_url = normalize_base_url(base_url)?;

        Ok(Self {
            email: email.to_string(),
            base_url,
            auth_header: build_auth_header(email, token),
        })
    }

    /// Create credentials from environment-loaded account values.
    pub fn from_account(account: &Account) -> Result<Self, ConfigError> {
        Self::new(&account.email, &account.token, &account.base_url)
    }

    /// Get the authorization header value for HTTP requests.
    ///
    /// Returns the complete "Basic ..." header value.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }

    /// Get the email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Get the site base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a Jira REST v3 path such as `/issue/PROJ-1`.
    pub fn jira_url(&self, path: &str) -> String {
        format!("{}/rest/api/3{}", self.base_url, path)
    }

    /// Absolute URL for a Confluence REST path such as `/content/123`.
    pub fn wiki_url(&self, path: &str) -> String {
        format!("{}/wiki/rest/api{}", self.base_url, path)
    }

    /// Browser URL for a Jira issue.
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }

    /// Browser URL for a Confluence `webui` link.
    pub fn wiki_web_url(&self, webui: &str) -> String {
        format!("{}/wiki{}", self.base_url, webui)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Build the Basic Auth header value.
///
/// Encodes "email:token" in Base64 and prepends "Basic ".
fn build_auth_header(email: &str, token: &str) -> String {
    let credentials = format!("{}:{}", email, token);
    let encoded = BASE64.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}

/// Validate the base URL and strip trailing slashes.
fn normalize_base_url(url: &str) -> Result<String, ConfigError> {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "base URL cannot be empty".to_string(),
        ));
    }

    let parsed = Url::parse(url).map_err(|e| {
        ConfigError::ValidationError(format!("'{}' is not a valid URL: {}", url, e))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "base URL '{}' must be an http:// or https:// address",
            url
        )));
    }

    // Plain http is tolerated for local test servers.
    if parsed.scheme() != "https"
        && !matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1"))
    {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_auth_header() {
        let header = build_auth_header("user@example.com", "api_token_here");
        assert!(header.starts_with("Basic "));

        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = BASE64.decode(encoded).unwrap();
        let decoded_str = String::from_utf8(decoded).unwrap();
        assert_eq!(decoded_str, "user@example.com:api_token_here");
    }

    #[test]
    fn test_credentials_new() {
        let creds =
            Credentials::new("user@example.com", "secret_token", "https://acme.atlassian.net")
                .unwrap();
        assert_eq!(creds.email(), "user@example.com");
        assert_eq!(creds.base_url(), "https://acme.atlassian.net");
        assert!(creds.header_value().starts_with("Basic "));
    }

    #[test]
    fn test_credentials_do_not_expose_token() {
        let creds =
            Credentials::new("user@example.com", "secret_token", "https://acme.atlassian.net")
                .unwrap();
        let debug_output = format!("{:?}", creds);
        assert!(!debug_output.contains("secret_token"));
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(Credentials::new("", "t", "https://acme.atlassian.net").is_err());
        assert!(Credentials::new("a@b.com", "", "https://acme.atlassian.net").is_err());
        assert!(Credentials::new("a@b.com", "t", "").is_err());
    }

    #[test]
    fn test_non_email_identity_rejected() {
        let err = Credentials::new("not-an-email", "t", "https://acme.atlassian.net").unwrap_err();
        assert!(err.to_string().contains("valid email"));
    }

    #[test]
    fn test_malformed_base_url_rejected() {
        assert!(Credentials::new("a@b.com", "t", "acme.atlassian.net").is_err());
        assert!(Credentials::new("a@b.com", "t", "ftp://acme.atlassian.net").is_err());
        assert!(Credentials::new("a@b.com", "t", "https://").is_err());
    }

    #[test]
    fn test_trailing_slashes_removed() {
        let creds =
            Credentials::new("a@b.com", "t", "https://acme.atlassian.net///").unwrap();
        assert_eq!(creds.base_url(), "https://acme.atlassian.net");
    }

    #[test]
    fn test_service_urls() {
        let creds = Credentials::new("a@b.com", "t", "https://acme.atlassian.net").unwrap();
        assert_eq!(
            creds.jira_url("/myself"),
            "https://acme.atlassian.net/rest/api/3/myself"
        );
        assert_eq!(
            creds.wiki_url("/content/1"),
            "https://acme.atlassian.net/wiki/rest/api/content/1"
        );
        assert_eq!(
            creds.browse_url("RFID-1"),
            "https://acme.atlassian.net/browse/RFID-1"
        );
        assert_eq!(
            creds.wiki_web_url("/spaces/RFID/pages/1"),
            "https://acme.atlassian.net/wiki/spaces/RFID/pages/1"
        );
    }

    #[test]
    fn test_local_http_accepted() {
        let creds = Credentials::new("a@b.com", "t", "http://127.0.0.1:8080").unwrap();
        assert_eq!(creds.base_url(), "http://127.0.0.1:8080");
    }
}
