mod order_poller;
mod wallet_service;

pub use order_poller::OrderPoller;
pub use wallet_service::{PaymentOutcome, SharedWalletState, WalletService, WalletState};
