pub mod client;
pub mod gateway;

pub use client::{ApiRejection, HttpClient, RetryConfig, SessionAuth};
pub use gateway::HttpWalletGateway;
