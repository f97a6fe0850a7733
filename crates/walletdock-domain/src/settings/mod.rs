use serde::{Deserialize, Deserializer, Serialize};

use crate::shared::DomainError;
use crate::top_up::PayType;

/// Top-up related fields of the server status blob
///
/// The blob carries many other keys; only these four matter here and
/// anything else is ignored when reading it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUpSettings {
    #[serde(default)]
    pub top_up_link: String,
    #[serde(default = "default_min_topup")]
    pub min_topup: i64,
    #[serde(default)]
    pub enable_online_topup: bool,
    #[serde(default, deserialize_with = "lenient_pay_type")]
    pub pay_type: PayType,
}

fn default_min_topup() -> i64 {
    1
}

// Unknown or empty pay types fall back to the redirect flow
fn lenient_pay_type<'de, D>(deserializer: D) -> Result<PayType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("wx") => PayType::Wx,
        _ => PayType::Easy,
    })
}

impl Default for TopUpSettings {
    fn default() -> Self {
        Self {
            top_up_link: String::new(),
            min_topup: default_min_topup(),
            enable_online_topup: false,
            pay_type: PayType::default(),
        }
    }
}

impl TopUpSettings {
    /// Link where redemption codes can be bought
    pub fn top_up_link(&self) -> Result<&str, DomainError> {
        if self.top_up_link.trim().is_empty() {
            return Err(DomainError::Configuration(
                "The administrator has not set a top-up link".to_string(),
            ));
        }
        Ok(&self.top_up_link)
    }

    pub fn ensure_online_enabled(&self) -> Result<(), DomainError> {
        if !self.enable_online_topup {
            return Err(DomainError::OnlineTopUpDisabled);
        }
        Ok(())
    }
}
