use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Assigned by the backend when a QR payment is created
define_id!(OrderId);
// Local identifier of one payment dialog
define_id!(SessionId);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (1xxx)
    ValidationError = 1001,
    EmptyRedemptionCode = 1002,
    BelowMinimumTopUp = 1003,
    OnlineTopUpDisabled = 1004,
    PaymentMethodUnavailable = 1005,

    // Business (2xxx)
    RejectedByServer = 2001,

    // Network (3xxx)
    NetworkError = 3001,

    // Data (4xxx)
    DeserializationError = 4001,

    // Configuration & state (5xxx)
    ConfigurationError = 5001,
    InvalidState = 5002,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::EmptyRedemptionCode
            | ErrorCode::BelowMinimumTopUp
            | ErrorCode::PaymentMethodUnavailable => ErrorSeverity::Info,

            ErrorCode::OnlineTopUpDisabled
            | ErrorCode::RejectedByServer
            | ErrorCode::NetworkError => ErrorSeverity::Warning,

            ErrorCode::DeserializationError
            | ErrorCode::ConfigurationError
            | ErrorCode::InvalidState => ErrorSeverity::Error,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorCode::NetworkError)
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Please enter a redemption code")]
    EmptyRedemptionCode,

    #[error("Top-up count cannot be less than {minimum}")]
    BelowMinimumTopUp { minimum: i64 },

    #[error("Online top-up is not enabled by the administrator")]
    OnlineTopUpDisabled,

    #[error("Payment method {0} is not available")]
    PaymentMethodUnavailable(String),

    /// Business failure reported by the backend, message shown verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(_) => ErrorCode::ValidationError,
            DomainError::EmptyRedemptionCode => ErrorCode::EmptyRedemptionCode,
            DomainError::BelowMinimumTopUp { .. } => ErrorCode::BelowMinimumTopUp,
            DomainError::OnlineTopUpDisabled => ErrorCode::OnlineTopUpDisabled,
            DomainError::PaymentMethodUnavailable(_) => ErrorCode::PaymentMethodUnavailable,
            DomainError::Rejected(_) => ErrorCode::RejectedByServer,
            DomainError::Network(_) => ErrorCode::NetworkError,
            DomainError::Deserialization(_) => ErrorCode::DeserializationError,
            DomainError::Configuration(_) => ErrorCode::ConfigurationError,
            DomainError::InvalidState(_) => ErrorCode::InvalidState,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Validation errors are raised before any request is sent
    pub fn is_client_side(&self) -> bool {
        self.code().code() < 2000
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
