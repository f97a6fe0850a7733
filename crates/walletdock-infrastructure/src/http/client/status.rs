use anyhow::{Context, Result};
use reqwest::Method;

use walletdock_domain::settings::TopUpSettings;

use super::types::{truncate, SuccessEnvelope};

impl super::HttpClient {
    /// Fetch the public status blob with retry
    pub async fn get_status(&self) -> Result<TopUpSettings> {
        self.execute_with_retry("Get status", || async {
            let url = self.endpoint("/api/status")?;
            let response = self
                .request(Method::GET, url)?
                .send()
                .await
                .context("Failed to send status request")?;

            let text = Self::read_body("Status", response).await?;
            let envelope: SuccessEnvelope<TopUpSettings> = serde_json::from_str(&text)
                .with_context(|| {
                    format!("Failed to parse status response: {}", truncate(&text, 200))
                })?;

            envelope.into_data()
        })
        .await
    }
}
