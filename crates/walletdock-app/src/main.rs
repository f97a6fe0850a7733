use clap::Parser;
use std::process::ExitCode;

use walletdock_infrastructure::logging::get_log_dir;
use walletdock_lib::presentation::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("❌ Command failed: {}", e);
            if let Some(dir) = get_log_dir() {
                eprintln!("Logs: {}", dir.display());
            }
            ExitCode::from(e.exit_code())
        }
    }
}
