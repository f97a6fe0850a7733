use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use walletdock_domain::gateway::OrderStatus;
use walletdock_domain::notification::Notice;
use walletdock_domain::payment_session::{PollState, TickDecision};

use super::types::{PollContext, PollTaskConfig};

/// How the task left its loop
enum Exit {
    TimedOut,
    Paid,
}

impl super::OrderPoller {
    pub(super) fn spawn_poll_task(&self, config: PollTaskConfig) -> JoinHandle<()> {
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let exit = poll_until_done(&ctx, &config).await;
            finish(&ctx, &config, exit).await;
        })
    }
}

async fn poll_until_done(ctx: &PollContext, config: &PollTaskConfig) -> Exit {
    let policy = ctx.policy;
    let deadline = config.started + policy.timeout;
    let mut ticker = interval_at(config.started + policy.interval, policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Nothing outlives the deadline, neither the wait for a tick nor a check in flight
        if timeout_at(deadline, ticker.tick()).await.is_err()
            || policy.decide(config.started.elapsed()) == TickDecision::TimedOut
        {
            return timed_out(config, policy.timeout);
        }

        match timeout_at(deadline, ctx.gateway.check_order(&config.order_id)).await {
            Err(_) => {
                debug!("Status check for {} still in flight at the deadline", config.order_id);
                return timed_out(config, policy.timeout);
            }
            Ok(Ok(OrderStatus::Paid)) => {
                info!("Order {} paid", config.order_id);
                return Exit::Paid;
            }
            Ok(Ok(OrderStatus::Pending)) => {
                debug!("Order {} still pending", config.order_id);
            }
            Ok(Err(e)) => {
                // Tolerated until the deadline
                warn!("Order status check for {} failed: {}", config.order_id, e);
                ctx.notifier
                    .notify(Notice::error("Failed to query order status"));
            }
        }
    }
}

fn timed_out(config: &PollTaskConfig, timeout: Duration) -> Exit {
    info!(
        "Order {} not paid within {}s, closing payment dialog",
        config.order_id,
        timeout.as_secs()
    );
    Exit::TimedOut
}

async fn finish(ctx: &PollContext, config: &PollTaskConfig, exit: Exit) {
    if !owns_slot(ctx, config).await {
        debug!("Poll task for {} lost its slot, exiting quietly", config.order_id);
        return;
    }

    match exit {
        Exit::TimedOut => {
            {
                let mut state = ctx.wallet_state.lock().await;
                if let Some(session) = state.payment.as_mut() {
                    if session.id() == &config.session_id {
                        session.expire();
                    }
                }
            }
            release_slot(ctx, config, PollState::TimedOut {
                session_id: config.session_id.clone(),
                order_id: config.order_id.clone(),
            })
            .await;
        }
        Exit::Paid => {
            let grace_deadline = Instant::now() + ctx.policy.success_grace;

            ctx.notifier.notify(Notice::success("Payment succeeded"));
            {
                let mut state = ctx.wallet_state.lock().await;
                if let Some(session) = state.payment.as_mut() {
                    if session.id() == &config.session_id {
                        session.mark_paid();
                    }
                }
            }
            ctx.state_tx.send_replace(PollState::Succeeded {
                session_id: config.session_id.clone(),
                order_id: config.order_id.clone(),
            });

            // Refresh the balance while the paid state is on screen
            match timeout_at(grace_deadline, ctx.gateway.fetch_profile()).await {
                Ok(Ok(profile)) => {
                    ctx.wallet_state.lock().await.wallet.load(profile.quota);
                    info!("Balance refreshed after payment: {}", profile.quota);
                }
                Ok(Err(e)) => warn!("Balance refresh after payment failed: {}", e),
                Err(_) => warn!("Balance refresh after payment timed out"),
            }

            sleep_until(grace_deadline).await;

            {
                let mut state = ctx.wallet_state.lock().await;
                if let Some(session) = state.payment.as_mut() {
                    if session.id() == &config.session_id {
                        session.finish();
                    }
                }
            }
            release_slot(ctx, config, PollState::Succeeded {
                session_id: config.session_id.clone(),
                order_id: config.order_id.clone(),
            })
            .await;
        }
    }
}

async fn owns_slot(ctx: &PollContext, config: &PollTaskConfig) -> bool {
    matches!(
        ctx.active.lock().await.as_ref(),
        Some(poll) if poll.generation == config.generation
    )
}

/// Empty the slot if it still belongs to this task
async fn release_slot(ctx: &PollContext, config: &PollTaskConfig, final_state: PollState) {
    let mut active = ctx.active.lock().await;
    match active.as_ref() {
        Some(poll) if poll.generation == config.generation => {
            *active = None;
            ctx.polling_tx.send_replace(false);
            ctx.state_tx.send_replace(final_state);
            debug!("Poll slot released by order {}", config.order_id);
        }
        Some(poll) => {
            error!(
                "Poll task for {} finished but the slot belongs to {}",
                config.order_id, poll.order_id
            );
        }
        None => {}
    }
}
