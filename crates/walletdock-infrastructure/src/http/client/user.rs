use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::json;

use walletdock_domain::gateway::UserProfile;

use super::types::{truncate, SuccessEnvelope};

impl super::HttpClient {
    /// Get the current user's quota with retry
    pub async fn get_user_self(&self) -> Result<UserProfile> {
        self.execute_with_retry("Get user self", || self.get_user_self_once())
            .await
    }

    async fn get_user_self_once(&self) -> Result<UserProfile> {
        let url = self.endpoint("/api/user/self")?;
        let response = self
            .request(Method::GET, url)?
            .send()
            .await
            .context("Failed to send user self request")?;

        let text = Self::read_body("User self", response).await?;
        let envelope: SuccessEnvelope<UserProfile> = serde_json::from_str(&text).with_context(
            || format!("Failed to parse user self response: {}", truncate(&text, 200)),
        )?;

        envelope.into_data()
    }

    /// Redeem a code; returns the quota it granted
    ///
    /// Not retried: a redemption that reached the server must not be replayed.
    pub async fn redeem_code(&self, key: &str) -> Result<i64> {
        log::info!("Submitting redemption code");

        let url = self.endpoint("/api/user/topup")?;
        let response = self
            .request(Method::POST, url)?
            .json(&json!({ "key": key }))
            .send()
            .await
            .context("Failed to send redemption request")?;

        let text = Self::read_body("Redeem", response).await?;
        let envelope: SuccessEnvelope<i64> = serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse redemption response: {}", truncate(&text, 200))
        })?;

        envelope.into_data()
    }
}
