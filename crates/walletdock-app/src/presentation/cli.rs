use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::application::services::{PaymentOutcome, WalletService};
use crate::presentation::bootstrap::{build_app, AppContext};
use crate::presentation::error::{CommandError, CommandResult};
use walletdock_domain::payment_session::{CancelReason, PaymentSession, PollState};
use walletdock_domain::top_up::PaymentMethod;
use walletdock_domain::wallet::render_quota;

/// How often the payment countdown is printed
const COUNTDOWN_STEP: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "walletdock", author, version, about = "Wallet balance, redemption codes and online top-up", long_about = None)]
pub struct Cli {
    /// Path to config.json
    #[arg(long, global = true, env = "WALLETDOCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the current balance
    Balance,
    /// Exchange a redemption code for quota
    Redeem {
        /// The redemption code
        code: String,
    },
    /// Print the link where redemption codes are sold
    Link,
    /// Print the payable amount for a top-up count
    Quote {
        /// Number of units to buy
        #[arg(allow_negative_numbers = true)]
        count: i64,
        /// Promotional top-up code
        #[arg(long, default_value = "")]
        top_up_code: String,
    },
    /// Buy quota online
    Pay {
        /// Number of units to buy
        #[arg(allow_negative_numbers = true)]
        count: i64,
        /// Payment method: zfb (Alipay) or wx (WeChat)
        #[arg(long, value_parser = parse_method)]
        method: PaymentMethod,
        /// Promotional top-up code
        #[arg(long, default_value = "")]
        top_up_code: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Fetch the top-up settings from the server and persist them
    SyncStatus,
}

fn parse_method(value: &str) -> Result<PaymentMethod, String> {
    PaymentMethod::parse(value).map_err(|e| e.to_string())
}

pub async fn run(cli: Cli) -> CommandResult<()> {
    let app = build_app(cli.config, cli.verbose).map_err(|e| {
        eprintln!("{}", e);
        e
    })?;

    match cli.command {
        Commands::Balance => balance(&app).await,
        Commands::Redeem { code } => redeem(&app, code).await,
        Commands::Link => link(&app).await,
        Commands::Quote { count, top_up_code } => quote(&app, count, top_up_code).await,
        Commands::Pay {
            count,
            method,
            top_up_code,
            yes,
        } => pay(&app, count, method, top_up_code, yes).await,
        Commands::SyncStatus => sync_status(&app).await,
    }
}

async fn balance(app: &AppContext) -> CommandResult<()> {
    let quota = app.service.load_balance().await?;
    println!("Balance: {}", render_quota(quota));
    Ok(())
}

async fn redeem(app: &AppContext, code: String) -> CommandResult<()> {
    let service = &app.service;
    // A failed load leaves the balance at zero; the redemption still goes through
    let _ = service.load_balance().await;

    service.set_redemption_code(code).await;
    service.redeem().await?;
    println!("Balance: {}", render_quota(service.balance().await));
    Ok(())
}

async fn link(app: &AppContext) -> CommandResult<()> {
    let link = app.service.open_top_up_link().await?;
    println!("{}", link);
    Ok(())
}

async fn quote(app: &AppContext, count: i64, top_up_code: String) -> CommandResult<()> {
    let service = &app.service;
    service.set_top_up_code(top_up_code).await;
    let quote = service.set_top_up_count(count).await?;
    println!("{} units: {}", quote.count, quote.render());
    Ok(())
}

async fn pay(
    app: &AppContext,
    count: i64,
    method: PaymentMethod,
    top_up_code: String,
    yes: bool,
) -> CommandResult<()> {
    let service = &app.service;
    let _ = service.load_balance().await;

    service.set_top_up_code(top_up_code).await;
    service.set_top_up_count(count).await?;
    let quote = service.pre_top_up(method).await?;

    println!("Top-up: {} units", quote.count);
    println!("Amount: {}", quote.render());
    println!("Method: {}", method_label(method));

    if !yes && !confirm("Proceed with payment? [y/N] ").await? {
        service.cancel_confirmation().await;
        println!("Top-up cancelled");
        return Ok(());
    }

    match service.confirm_top_up().await? {
        PaymentOutcome::Redirected(submitted) => {
            match submitted.location {
                Some(location) => println!("Open {} in your browser to pay", location),
                None => println!("Payment page opened"),
            }
            Ok(())
        }
        PaymentOutcome::AwaitingScan(session) => wait_for_payment(service, &session).await,
    }
}

async fn sync_status(app: &AppContext) -> CommandResult<()> {
    let settings = app.service.sync_status().await?;
    app.settings_store.save(&settings)?;

    println!(
        "Online top-up: {}",
        if settings.enable_online_topup {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("Pay type: {:?}", settings.pay_type);
    let methods: Vec<&str> = settings
        .pay_type
        .available_methods()
        .into_iter()
        .map(method_label)
        .collect();
    println!("Payment methods: {}", methods.join(", "));
    println!("Minimum top-up: {}", settings.min_topup);
    if !settings.top_up_link.is_empty() {
        println!("Top-up link: {}", settings.top_up_link);
    }
    Ok(())
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Alipay => "Alipay",
        PaymentMethod::WeChat => "WeChat",
    }
}

async fn confirm(prompt: &str) -> CommandResult<bool> {
    use std::io::Write;

    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Show the QR payload and countdown until the poller lets go of the order
///
/// Ctrl-C closes the dialog; the countdown reaching zero closes it too.
async fn wait_for_payment(service: &WalletService, session: &PaymentSession) -> CommandResult<()> {
    println!("Scan to pay: {}", session.qr_url());
    println!("Order: {}", session.order_id());
    println!(
        "Waiting for payment until {} (Ctrl-C to close)",
        session.deadline().with_timezone(&chrono::Local).format("%H:%M:%S")
    );

    let poller = service.poller();
    let idle = poller.wait_until_idle();
    tokio::pin!(idle);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ctrl_c_armed = true;

    let mut countdown = tokio::time::interval(COUNTDOWN_STEP);
    // The first tick completes immediately
    countdown.tick().await;

    loop {
        tokio::select! {
            _ = &mut idle => break,
            signal = &mut ctrl_c, if ctrl_c_armed => {
                ctrl_c_armed = false;
                match signal {
                    Ok(()) => {
                        info!("Payment dialog closed by user");
                        service.close_payment_dialog().await;
                    }
                    Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                }
            }
            _ = countdown.tick() => {
                let remaining = session.remaining(chrono::Utc::now());
                if remaining.is_zero() {
                    service.countdown_finished().await;
                } else {
                    println!("{}s left", remaining.as_secs());
                }
            }
        }
    }

    match service.poller().state() {
        PollState::Succeeded { .. } => {
            println!("Balance: {}", render_quota(service.balance().await));
            Ok(())
        }
        PollState::TimedOut { .. } => Err(CommandError::from_code(
            walletdock_domain::ErrorCode::InvalidState,
            "Payment window expired",
        )),
        PollState::Cancelled { reason, .. } => {
            let message = match reason {
                CancelReason::DialogClosed => "Payment dialog closed",
                CancelReason::CountdownFinished => "Payment window expired",
                CancelReason::Superseded => "Payment replaced by a newer order",
            };
            println!("{}", message);
            Ok(())
        }
        PollState::Idle | PollState::Active { .. } => Ok(()),
    }
}
