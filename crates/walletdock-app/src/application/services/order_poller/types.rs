use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use walletdock_domain::gateway::WalletGateway;
use walletdock_domain::notification::Notifier;
use walletdock_domain::payment_session::{PollPolicy, PollState};
use walletdock_domain::shared::{OrderId, SessionId};

use crate::application::services::SharedWalletState;

/// The one poll task allowed to run
pub(super) struct ActivePoll {
    pub generation: u64,
    pub session_id: SessionId,
    pub order_id: OrderId,
    pub handle: JoinHandle<()>,
}

/// Everything a spawned poll task needs, cloned out of the poller
#[derive(Clone)]
pub(super) struct PollContext {
    pub gateway: Arc<dyn WalletGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub wallet_state: SharedWalletState,
    pub policy: PollPolicy,
    pub active: Arc<Mutex<Option<ActivePoll>>>,
    pub state_tx: Arc<watch::Sender<PollState>>,
    pub polling_tx: Arc<watch::Sender<bool>>,
}

/// Identity and timing of one spawned task
pub(super) struct PollTaskConfig {
    pub generation: u64,
    pub session_id: SessionId,
    pub order_id: OrderId,
    pub started: Instant,
}
