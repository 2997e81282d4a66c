//! Request execution.
//!
//! Sends one [`RequestDescriptor`] with authentication, a per-exchange
//! timeout and the retry policy applied.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use super::auth::Credentials;
use super::error::{ApiError, Result};
use super::mapper::{self, RawResponse};
use super::request::{RequestBody, RequestDescriptor};
use super::retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
use crate::config::HttpSettings;

/// Header Atlassian requires on multipart uploads.
const NO_CHECK_HEADER: &str = "X-Atlassian-Token";

/// Executes requests against the Atlassian site.
#[derive(Debug)]
pub struct Executor {
    /// The HTTP client.
    client: Client,
    /// Authentication credentials.
    credentials: Credentials,
    /// Retry policy for transient failures.
    policy: RetryPolicy,
    /// Waits between attempts.
    sleeper: Arc<dyn Sleeper>,
}

impl Executor {
    /// Create an executor with the given credentials and HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| mapper::error_from_transport(&e))?;

        Ok(Self {
            client,
            credentials,
            policy: RetryPolicy::from_settings(settings),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The credentials in use.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a request and decode the JSON response into `T`.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T> {
        let raw = self.execute(request).await?;
        mapper::decode(&raw)
    }

    /// Execute a request, retrying transient failures.
    ///
    /// Returns the raw body of the first successful response, or the error
    /// of the last attempt.
    #[instrument(
        skip(self, request),
        fields(method = %request.method, url = %request.url, paged = request.expects_pages)
    )]
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let mut attempt = 1;

        loop {
            debug!("Request attempt {}/{}", attempt, self.policy.max_attempts);

            let error = match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            match self.policy.decide(attempt, &error, request.is_idempotent()) {
                RetryDecision::Retry {
                    next_attempt,
                    delay,
                } => {
                    warn!(
                        "Request failed (attempt {}), retrying in {}ms: {}",
                        attempt,
                        delay.as_millis(),
                        error
                    );
                    self.sleeper.sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::GiveUp => {
                    if error.is_transient() {
                        error!("Request failed after {} attempt(s): {}", attempt, error);
                    } else {
                        debug!("Request failed: {}", error);
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Perform a single exchange.
    async fn send_once(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(header::AUTHORIZATION, self.credentials.header_value())
            .header(header::ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            Some(RequestBody::Json(body)) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .json(body),
            Some(RequestBody::File(attachment)) => {
                let mut part = Part::bytes(attachment.data.clone())
                    .file_name(attachment.file_name.clone());
                if let Some(content_type) = &attachment.content_type {
                    part = part.mime_str(content_type).map_err(|e| {
                        ApiError::invalid(format!("invalid content type '{}': {}", content_type, e))
                    })?;
                }
                builder
                    .header(NO_CHECK_HEADER, "no-check")
                    .multipart(Form::new().part("file", part))
            }
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| mapper::error_from_transport(&e))?;

        let status = response.status();
        let retry_after = mapper::parse_retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| mapper::error_from_transport(&e))?;

        if status.is_success() {
            Ok(RawResponse { status, body })
        } else {
            debug!("Error response body: {}", body);
            Err(mapper::error_from_response(
                status,
                &request.resource,
                &body,
                retry_after,
            ))
        }
    }
}
