use async_trait::async_trait;

use walletdock_domain::gateway::{OrderStatus, UserProfile, WalletGateway};
use walletdock_domain::settings::TopUpSettings;
use walletdock_domain::shared::{DomainError, OrderId};
use walletdock_domain::top_up::{PayType, PaymentIntent, TopUpRequest};

use super::client::{ApiRejection, HttpClient};

/// `WalletGateway` over the backend's HTTP API
pub struct HttpWalletGateway {
    client: HttpClient,
}

impl HttpWalletGateway {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

/// Sort an infrastructure failure into the domain's error categories
pub fn to_domain_error(err: anyhow::Error) -> DomainError {
    if let Some(rejection) = err.downcast_ref::<ApiRejection>() {
        return DomainError::Rejected(rejection.0.clone());
    }
    if err.downcast_ref::<reqwest::Error>().is_some() {
        return DomainError::Network(format!("{:#}", err));
    }
    if err.downcast_ref::<url::ParseError>().is_some() {
        return DomainError::Configuration(format!("{:#}", err));
    }
    DomainError::Deserialization(format!("{:#}", err))
}

#[async_trait]
impl WalletGateway for HttpWalletGateway {
    async fn fetch_profile(&self) -> Result<UserProfile, DomainError> {
        self.client.get_user_self().await.map_err(to_domain_error)
    }

    async fn redeem(&self, code: &str) -> Result<i64, DomainError> {
        self.client.redeem_code(code).await.map_err(to_domain_error)
    }

    async fn quote_amount(&self, count: i64, top_up_code: &str) -> Result<f64, DomainError> {
        self.client
            .quote_amount(count, top_up_code)
            .await
            .map_err(to_domain_error)
    }

    async fn create_payment(
        &self,
        pay_type: PayType,
        request: &TopUpRequest,
    ) -> Result<PaymentIntent, DomainError> {
        self.client
            .create_payment(pay_type, request)
            .await
            .map_err(to_domain_error)
    }

    async fn check_order(&self, order_id: &OrderId) -> Result<OrderStatus, DomainError> {
        self.client
            .check_order(order_id)
            .await
            .map_err(to_domain_error)
    }

    async fn fetch_status(&self) -> Result<TopUpSettings, DomainError> {
        self.client.get_status().await.map_err(to_domain_error)
    }
}
