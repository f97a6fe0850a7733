// Domain layer - Pure wallet and top-up logic
// No dependencies on infrastructure or presentation layers

pub mod checkout;
pub mod gateway;
pub mod notification;
pub mod payment_session;
pub mod settings;
pub mod shared;
pub mod top_up;
pub mod wallet;

// Re-exports for convenience
pub use shared::{DomainError, ErrorCode, ErrorSeverity, OrderId};
