use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::http::client::{SessionAuth, DEFAULT_API_USER_KEY, USER_AGENT};

pub const ENV_BASE_URL: &str = "WALLETDOCK_BASE_URL";
pub const ENV_ACCESS_TOKEN: &str = "WALLETDOCK_ACCESS_TOKEN";
pub const ENV_API_USER: &str = "WALLETDOCK_API_USER";

const APP_DIR: &str = "walletdock";

/// Persistent client configuration (`config.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_cookie: HashMap<String, String>,
    pub api_user_key: String,
    pub api_user: String,
    pub access_token: Option<String>,
    pub user_agent: String,
    pub checkout_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            session_cookie: HashMap::new(),
            api_user_key: DEFAULT_API_USER_KEY.to_string(),
            api_user: String::new(),
            access_token: None,
            user_agent: USER_AGENT.to_string(),
            checkout_dir: None,
            log_dir: None,
        }
    }
}

impl ClientConfig {
    /// `<config dir>/walletdock`
    pub fn app_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or_else(|| anyhow::anyhow!("Failed to get config dir"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.json"))
    }

    /// Load config from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            serde_json::from_str::<ClientConfig>(&content)
                .with_context(|| format!("Invalid config file {:?}", path))?
        } else {
            ClientConfig::default()
        };

        info!("Config loaded from: {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `WALLETDOCK_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            self.access_token = Some(token);
        }
        if let Some(api_user) = lookup(ENV_API_USER).filter(|v| !v.is_empty()) {
            self.api_user = api_user;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("base_url must be http or https: {}", self.base_url);
        }
        if self.api_user_key.is_empty() {
            anyhow::bail!("api_user_key cannot be empty");
        }
        Ok(())
    }

    pub fn session_auth(&self) -> SessionAuth {
        SessionAuth {
            cookies: self.session_cookie.clone(),
            api_user_key: self.api_user_key.clone(),
            api_user: self.api_user.clone(),
            access_token: self.access_token.clone(),
        }
    }

    pub fn checkout_dir(&self) -> PathBuf {
        self.checkout_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join(APP_DIR).join("checkout")))
            .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join(APP_DIR).join("logs")))
            .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR).join("logs"))
    }
}
