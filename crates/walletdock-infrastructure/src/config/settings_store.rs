use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use walletdock_domain::settings::TopUpSettings;

/// The persisted status blob, read once when a wallet session starts
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing blob means the status was never synced: use defaults
    pub fn load(&self) -> Result<TopUpSettings> {
        if !self.path.exists() {
            warn!(
                "Status blob {:?} not found, online top-up stays disabled until synced",
                self.path
            );
            return Ok(TopUpSettings::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read status blob {:?}", self.path))?;
        let settings = serde_json::from_str::<TopUpSettings>(&content)
            .with_context(|| format!("Invalid status blob {:?}", self.path))?;

        info!(
            "Top-up settings: min_topup={}, online={}, pay_type={:?}",
            settings.min_topup, settings.enable_online_topup, settings.pay_type
        );
        Ok(settings)
    }

    pub fn save(&self, settings: &TopUpSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write status blob {:?}", self.path))?;
        info!("Status blob saved to {:?}", self.path);
        Ok(())
    }
}
