use std::time::Duration;

use walletdock_domain::payment_session::PollPolicy;

/// Configuration for the timeout durations used across the client
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// HTTP request timeout
    pub http_request: Duration,

    /// Delay between order status checks
    pub poll_interval: Duration,

    /// How long a QR payment dialog stays open
    pub poll_timeout: Duration,

    /// Time the paid state stays on screen before cleanup
    pub success_grace: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        GLOBAL_TIMEOUT_CONFIG.clone()
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global timeout configuration
    pub fn global() -> &'static Self {
        &GLOBAL_TIMEOUT_CONFIG
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            timeout: self.poll_timeout,
            success_grace: self.success_grace,
        }
    }
}

/// Global timeout configuration instance
static GLOBAL_TIMEOUT_CONFIG: TimeoutConfig = TimeoutConfig {
    http_request: Duration::from_secs(30),
    poll_interval: Duration::from_secs(6),
    poll_timeout: Duration::from_secs(300),
    success_grace: Duration::from_secs(3),
};
