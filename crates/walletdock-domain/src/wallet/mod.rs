use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

/// Quota units that make up one unit of display currency
pub const QUOTA_PER_UNIT: f64 = 500_000.0;

/// Wallet value object
/// Holds the user's spendable quota as last reported by the server,
/// plus any local adjustments from successful redemptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    quota: i64,
    last_loaded_at: Option<DateTime<Utc>>,
}

impl Wallet {
    pub fn new(quota: i64) -> Self {
        Self {
            quota,
            last_loaded_at: Some(Utc::now()),
        }
    }

    /// Replace quota with the value fetched from the server
    pub fn load(&mut self, quota: i64) {
        self.quota = quota;
        self.last_loaded_at = Some(Utc::now());
    }

    /// Add the quota granted by a redemption code
    pub fn apply_redemption(&mut self, delta: i64) -> Result<(), DomainError> {
        if delta < 0 {
            return Err(DomainError::Validation(
                "Redeemed quota cannot be negative".to_string(),
            ));
        }

        self.quota = self
            .quota
            .checked_add(delta)
            .ok_or_else(|| DomainError::Validation("Quota overflow".to_string()))?;

        Ok(())
    }

    pub fn quota(&self) -> i64 {
        self.quota
    }

    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        self.last_loaded_at
    }

    pub fn is_loaded(&self) -> bool {
        self.last_loaded_at.is_some()
    }

    pub fn render(&self) -> String {
        render_quota(self.quota)
    }
}

/// Render quota as display currency with two decimals, e.g. `$1.00`
pub fn render_quota(quota: i64) -> String {
    format!("${:.2}", quota as f64 / QUOTA_PER_UNIT)
}
