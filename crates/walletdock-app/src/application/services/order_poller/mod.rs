mod task_spawner;
mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{info, warn};

use walletdock_domain::gateway::WalletGateway;
use walletdock_domain::notification::Notifier;
use walletdock_domain::payment_session::{CancelReason, PaymentSession, PollPolicy, PollState};
use walletdock_domain::shared::OrderId;

use super::SharedWalletState;
use types::{ActivePoll, PollContext, PollTaskConfig};

/// Polls one QR order at a time until it is paid, expires or is dismissed
///
/// The handle of the running task lives in a single slot. Every exit path
/// (timeout, success after the grace delay, dialog close, countdown finish,
/// a newer session) empties that slot.
pub struct OrderPoller {
    ctx: PollContext,
    generation: AtomicU64,
    state_rx: watch::Receiver<PollState>,
    polling_rx: watch::Receiver<bool>,
}

impl OrderPoller {
    pub fn new(
        gateway: Arc<dyn WalletGateway>,
        notifier: Arc<dyn Notifier>,
        wallet_state: SharedWalletState,
        policy: PollPolicy,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(PollState::Idle);
        let (polling_tx, polling_rx) = watch::channel(false);

        Self {
            ctx: PollContext {
                gateway,
                notifier,
                wallet_state,
                policy,
                active: Arc::new(Mutex::new(None)),
                state_tx: Arc::new(state_tx),
                polling_tx: Arc::new(polling_tx),
            },
            generation: AtomicU64::new(0),
            state_rx,
            polling_rx,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.ctx.policy
    }

    /// Open a payment session for `order_id` and start polling it
    ///
    /// A session that is still polling is cancelled first.
    pub async fn start(&self, order_id: OrderId, qr_url: impl Into<String>) -> PaymentSession {
        let mut active = self.ctx.active.lock().await;

        if let Some(old) = active.take() {
            warn!(
                "Superseding poll for order {} with order {}",
                old.order_id, order_id
            );
            old.handle.abort();
            self.ctx.state_tx.send_replace(PollState::Cancelled {
                session_id: old.session_id,
                order_id: old.order_id,
                reason: CancelReason::Superseded,
            });
        }

        let session = PaymentSession::open(order_id.clone(), qr_url, self.ctx.policy.timeout);
        {
            let mut state = self.ctx.wallet_state.lock().await;
            if let Some(previous) = state.payment.as_mut() {
                previous.close();
            }
            state.payment = Some(session.clone());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = self.spawn_poll_task(PollTaskConfig {
            generation,
            session_id: session.id().clone(),
            order_id: order_id.clone(),
            started: Instant::now(),
        });

        *active = Some(ActivePoll {
            generation,
            session_id: session.id().clone(),
            order_id: order_id.clone(),
            handle,
        });
        self.ctx.polling_tx.send_replace(true);
        self.ctx.state_tx.send_replace(PollState::Active {
            session_id: session.id().clone(),
            order_id,
        });

        info!(
            "Order polling started for {} (every {}s, deadline {})",
            session.order_id(),
            self.ctx.policy.interval.as_secs(),
            session.deadline().format("%H:%M:%S")
        );

        session
    }

    /// Stop polling because the user dismissed the dialog or the countdown ran out
    ///
    /// Returns false when nothing was polling.
    pub async fn cancel(&self, reason: CancelReason) -> bool {
        let mut active = self.ctx.active.lock().await;
        let Some(poll) = active.take() else {
            return false;
        };
        poll.handle.abort();
        self.ctx.polling_tx.send_replace(false);
        drop(active);

        {
            let mut state = self.ctx.wallet_state.lock().await;
            if let Some(session) = state.payment.as_mut() {
                if session.id() == &poll.session_id {
                    session.close();
                }
            }
        }

        // A paid order stays paid even if the dialog is closed during the grace delay
        let already_paid = matches!(
            &*self.ctx.state_tx.borrow(),
            PollState::Succeeded { session_id, .. } if session_id == &poll.session_id
        );
        if !already_paid {
            self.ctx.state_tx.send_replace(PollState::Cancelled {
                session_id: poll.session_id,
                order_id: poll.order_id.clone(),
                reason,
            });
        }

        info!("Order polling for {} cancelled ({:?})", poll.order_id, reason);
        true
    }

    /// Whether a poll task currently holds the slot
    pub async fn is_polling(&self) -> bool {
        self.ctx.active.lock().await.is_some()
    }

    pub fn state(&self) -> PollState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state_rx.clone()
    }

    /// Resolves once no poll task holds the slot
    pub async fn wait_until_idle(&self) {
        let mut rx = self.polling_rx.clone();
        let _ = rx.wait_for(|polling| !*polling).await;
    }
}

impl Drop for OrderPoller {
    fn drop(&mut self) {
        if let Ok(mut active) = self.ctx.active.try_lock() {
            if let Some(poll) = active.take() {
                poll.handle.abort();
            }
        }
    }
}
