use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::application::services::WalletService;
use crate::presentation::error::CommandResult;
use walletdock_domain::checkout::FormSubmitter;
use walletdock_domain::gateway::WalletGateway;
use walletdock_domain::notification::Notifier;
use walletdock_infrastructure::checkout::HtmlFormSubmitter;
use walletdock_infrastructure::config::{ClientConfig, SettingsStore, TimeoutConfig};
use walletdock_infrastructure::http::{HttpClient, HttpWalletGateway, RetryConfig};
use walletdock_infrastructure::logging::init_logger;
use walletdock_infrastructure::notification::ConsoleNotifier;

const STATUS_FILE: &str = "status.json";

/// Everything one CLI invocation works with
pub struct AppContext {
    pub config: ClientConfig,
    pub config_path: PathBuf,
    pub settings_store: SettingsStore,
    pub service: Arc<WalletService>,
}

/// The status blob lives next to the config file
pub fn status_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join(STATUS_FILE))
        .unwrap_or_else(|| PathBuf::from(STATUS_FILE))
}

pub fn build_app(config_path: Option<PathBuf>, verbose: bool) -> CommandResult<AppContext> {
    let startup_started_at = Instant::now();

    let config_path = match config_path {
        Some(path) => path,
        None => ClientConfig::default_path()?,
    };
    let mut config = ClientConfig::load(&config_path)?;
    config.apply_env();
    config.validate()?;

    let log_dir = config.log_dir();
    match init_logger(log_dir.clone(), verbose) {
        Ok(_) => {
            info!("🚀 WalletDock starting...");
            info!("📝 File logging initialized at: {}", log_dir.display());
        }
        Err(e) => {
            eprintln!("⚠️  Failed to initialize file logging: {}", e);
        }
    }
    info!("Config path: {}", config_path.display());

    let timeouts = TimeoutConfig::global();
    let client = HttpClient::with_options(
        &config.base_url,
        config.session_auth(),
        &config.user_agent,
        timeouts.http_request,
        RetryConfig::default(),
    )?;
    let http_gateway = HttpWalletGateway::new(client);
    info!("Backend: {}", http_gateway.client().base_url());
    let gateway = Arc::new(http_gateway) as Arc<dyn WalletGateway>;
    let notifier = Arc::new(ConsoleNotifier::new()) as Arc<dyn Notifier>;
    let submitter = Arc::new(HtmlFormSubmitter::new(
        config.checkout_dir(),
        &config.user_agent,
    )) as Arc<dyn FormSubmitter>;

    let settings_store = SettingsStore::new(status_path(&config_path));
    let settings = settings_store.load()?;

    let service = Arc::new(WalletService::new(
        gateway,
        notifier,
        submitter,
        settings,
        timeouts.poll_policy(),
    ));

    info!(
        "✓ Wallet session ready ({}ms)",
        startup_started_at.elapsed().as_millis()
    );

    Ok(AppContext {
        config,
        config_path,
        settings_store,
        service,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_blob_sits_next_to_config() {
        let path = status_path(Path::new("/etc/walletdock/config.json"));
        assert_eq!(path, PathBuf::from("/etc/walletdock/status.json"));
    }

    #[test]
    fn test_build_app_with_missing_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let config = ClientConfig {
            log_dir: Some(dir.path().join("logs")),
            checkout_dir: Some(dir.path().join("checkout")),
            ..ClientConfig::default()
        };
        config.save(&config_path).unwrap();

        let app = build_app(Some(config_path.clone()), false).unwrap();
        assert_eq!(app.config_path, config_path);
        assert_eq!(app.settings_store.path(), dir.path().join("status.json"));
    }
}
