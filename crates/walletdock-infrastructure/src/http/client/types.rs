use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

pub const DEFAULT_API_USER_KEY: &str = "new-api-user";

/// HTTP retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds (default: 1000ms)
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds (default: 10000ms)
    pub max_backoff_ms: u64,
    /// Backoff multiplier (default: 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Credentials attached to every backend call
#[derive(Debug, Clone, Default)]
pub struct SessionAuth {
    pub cookies: HashMap<String, String>,
    pub api_user_key: String,
    pub api_user: String,
    pub access_token: Option<String>,
}

impl SessionAuth {
    pub fn cookie_header(&self) -> Option<String> {
        let mut pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort();
        Some(pairs.join("; "))
    }
}

/// Business failure reported by the backend (message shown verbatim)
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ApiRejection(pub String);

/// `{success, message, data}` responses of the user endpoints
#[derive(Debug, Deserialize)]
pub(super) struct SuccessEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> SuccessEnvelope<T> {
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(ApiRejection(self.message).into());
        }
        self.data
            .ok_or_else(|| anyhow::anyhow!("API response missing 'data' field"))
    }
}

/// `{message, data, url}` responses of the payment endpoints
///
/// `message == "success"` marks success; on failure the error text is in `data`.
#[derive(Debug, Deserialize)]
pub(super) struct MessageEnvelope {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub url: Option<String>,
}

impl MessageEnvelope {
    pub fn is_success(&self) -> bool {
        self.message == "success"
    }

    pub fn error_text(&self) -> String {
        match &self.data {
            serde_json::Value::String(s) if !s.is_empty() => s.clone(),
            _ if !self.message.is_empty() => self.message.clone(),
            _ => "Request failed".to_string(),
        }
    }

    pub fn into_success(self) -> Result<Self> {
        if !self.is_success() {
            return Err(ApiRejection(self.error_text()).into());
        }
        Ok(self)
    }
}

/// Render a JSON scalar the way a form field would carry it
pub(super) fn value_to_field(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extract domain from URL (including port if present)
pub(super) fn extract_domain(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)?;
    let host = parsed.host_str().unwrap_or("");

    if let Some(port) = parsed.port() {
        Ok(format!("{}://{}:{}", parsed.scheme(), host, port))
    } else {
        Ok(format!("{}://{}", parsed.scheme(), host))
    }
}

/// First `max` bytes of `text`, cut on a char boundary
pub(super) fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
