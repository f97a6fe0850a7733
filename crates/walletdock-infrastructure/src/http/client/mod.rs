mod payment;
mod status;
mod types;
mod user;

pub use types::{ApiRejection, RetryConfig, SessionAuth, DEFAULT_API_USER_KEY, USER_AGENT};

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

use types::{extract_domain, truncate};

pub struct HttpClient {
    pub(super) client: Client,
    pub(super) retry_config: RetryConfig,
    base_url: Url,
    auth: SessionAuth,
}

impl HttpClient {
    pub fn new(base_url: &str, auth: SessionAuth) -> Result<Self> {
        Self::with_options(
            base_url,
            auth,
            USER_AGENT,
            Duration::from_secs(30),
            RetryConfig::default(),
        )
    }

    pub fn with_options(
        base_url: &str,
        auth: SessionAuth,
        user_agent: &str,
        request_timeout: Duration,
        retry_config: RetryConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid backend base URL: {}", base_url))?;

        Ok(Self {
            client,
            retry_config,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(super) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for {}", path))
    }

    /// Request with the session headers every wallet endpoint expects
    pub(super) fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_str(&extract_domain(url.as_str())?)?,
        );

        if !self.auth.api_user.is_empty() {
            headers.insert(
                header::HeaderName::from_bytes(self.auth.api_user_key.as_bytes())?,
                header::HeaderValue::from_str(&self.auth.api_user)?,
            );
        }

        if let Some(token) = self.auth.access_token.as_deref() {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        if let Some(cookie_string) = self.auth.cookie_header() {
            headers.insert(header::COOKIE, header::HeaderValue::from_str(&cookie_string)?);
        }

        Ok(self.client.request(method, url).headers(headers))
    }

    /// Read a response body, turning 5xx and 429 into retryable errors
    pub(super) async fn read_body(operation: &str, response: Response) -> Result<String> {
        let status = response.status();
        log::info!("{} response status: {}", operation, status);

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            if let Err(e) = response.error_for_status_ref() {
                return Err(anyhow::Error::new(e).context(format!("{} failed", operation)));
            }
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", operation))?;

        if text.trim().starts_with('<') {
            warn!(
                "{} returned HTML instead of JSON: {}",
                operation,
                truncate(&text, 200)
            );
            anyhow::bail!(
                "{} returned HTML instead of JSON (status {})",
                operation,
                status
            );
        }

        debug!("{} response length: {} bytes", operation, text.len());
        Ok(text)
    }

    /// Run `request_fn` until it succeeds or fails with something a retry cannot fix
    ///
    /// Only idempotent calls go through here. See `is_retryable_error` for
    /// what counts as transient.
    pub(super) async fn execute_with_retry<F, Fut, T>(
        &self,
        operation_name: &str,
        mut request_fn: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        loop {
            attempt += 1;

            match request_fn().await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} attempts", operation_name, attempt);
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let should_retry =
                        attempt <= self.retry_config.max_retries && Self::is_retryable_error(&e);

                    if should_retry {
                        warn!(
                            "{} failed (attempt {}/{}): {}. Retrying in {}ms...",
                            operation_name, attempt, self.retry_config.max_retries, e, backoff_ms
                        );

                        sleep(Duration::from_millis(backoff_ms)).await;

                        backoff_ms = ((backoff_ms as f64 * self.retry_config.backoff_multiplier)
                            as u64)
                            .min(self.retry_config.max_backoff_ms);
                    } else {
                        if attempt > self.retry_config.max_retries && attempt > 1 {
                            warn!(
                                "{} failed after {} attempts",
                                operation_name, attempt
                            );
                        }
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Transport failures, 5xx and 429 are transient; a server rejection never is
    fn is_retryable_error(error: &anyhow::Error) -> bool {
        if error.downcast_ref::<ApiRejection>().is_some() {
            return false;
        }

        if let Some(reqwest_err) = error.downcast_ref::<reqwest::Error>() {
            if reqwest_err.is_connect() || reqwest_err.is_timeout() || reqwest_err.is_request() {
                return true;
            }

            if let Some(status) = reqwest_err.status() {
                return status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
            }
        }

        false
    }
}
