use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::settings::TopUpSettings;
use crate::shared::{DomainError, OrderId};
use crate::top_up::{PayType, PaymentIntent, TopUpRequest};

/// Fields of `/api/user/self` the wallet cares about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub quota: i64,
    #[serde(default)]
    pub used_quota: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Result of one order status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Paid,
    /// Any non-success body, including unknown orders
    Pending,
}

/// Request/response contract of the backend wallet endpoints
///
/// Server-reported business failures come back as `DomainError::Rejected`
/// carrying the server text; transport failures as `DomainError::Network`.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// `GET /api/user/self`
    async fn fetch_profile(&self) -> Result<UserProfile, DomainError>;

    /// `POST /api/user/topup`, returns the redeemed quota
    async fn redeem(&self, code: &str) -> Result<i64, DomainError>;

    /// `POST /api/user/amount`, returns the payable amount
    async fn quote_amount(&self, count: i64, top_up_code: &str) -> Result<f64, DomainError>;

    /// `POST /api/user/pay` or `/api/user/wxpay` depending on `pay_type`
    async fn create_payment(
        &self,
        pay_type: PayType,
        request: &TopUpRequest,
    ) -> Result<PaymentIntent, DomainError>;

    /// `GET /api/user/checkOrder?orderId=`
    async fn check_order(&self, order_id: &OrderId) -> Result<OrderStatus, DomainError>;

    /// `GET /api/status`
    async fn fetch_status(&self) -> Result<TopUpSettings, DomainError>;
}
