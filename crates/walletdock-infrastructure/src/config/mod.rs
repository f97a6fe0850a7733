mod client_config;
mod settings_store;
mod timeouts;

pub use client_config::{ClientConfig, ENV_ACCESS_TOKEN, ENV_API_USER, ENV_BASE_URL};
pub use settings_store::SettingsStore;
pub use timeouts::TimeoutConfig;
