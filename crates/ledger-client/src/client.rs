//! HTTP client for the contact ledger API

use crate::error::{ClientError, Result};
use crate::types::*;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

/// HTTP client for the contact ledger API
///
/// # Example
///
/// ```rust,no_run
/// use ledger_client::{ClientConfig, LedgerClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = LedgerClient::new(ClientConfig {
///     base_url: "https://api.example.com".into(),
///     api_key: Some("secret".into()),
///     ..Default::default()
/// })?;
///
/// let views = client.get_contact_views("user-42").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LedgerClient {
    config: ClientConfig,
    client: Client,
}

impl LedgerClient {
    /// Create a new ledger client
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ClientError::InvalidConfig(format!("api key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ==================== Contact views ====================

    /// Fetch the backend's ledger for a user.
    ///
    /// Returns `None` when the backend has no record for the user yet.
    pub async fn get_contact_views(&self, user_id: &str) -> Result<Option<ContactViews>> {
        let url = self.contact_views_url(user_id);

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(user_id, "No remote ledger for user");
            return Ok(None);
        }

        let views = self.handle_response(response).await?;
        Ok(Some(views))
    }

    /// Replace the backend's usage record for a user
    pub async fn put_contact_views(&self, user_id: &str, update: &UpdateContactViews) -> Result<()> {
        let url = self.contact_views_url(user_id);

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(update)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    // ==================== Purchases ====================

    /// Buy additional reveal credits; returns the post-purchase balance
    pub async fn add_credits(&self, request: &AddCreditsRequest) -> Result<AddCreditsResponse> {
        let url = format!("{}/contact-credits/add", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Activate an unlimited-contacts subscription
    pub async fn activate_subscription(
        &self,
        request: &ActivateSubscriptionRequest,
    ) -> Result<ActivateSubscriptionResponse> {
        let url = format!("{}/subscription/activate", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body = response.text().await?;

        let activation = if body.trim().is_empty() {
            ActivateSubscriptionResponse::default()
        } else {
            serde_json::from_str::<ActivateSubscriptionResponse>(&body)?
        };

        if !activation.success {
            return Err(ClientError::Rejected(
                activation
                    .message
                    .unwrap_or_else(|| "activation reported failure".to_string()),
            ));
        }

        Ok(activation)
    }

    // ==================== Helper Methods ====================

    fn contact_views_url(&self, user_id: &str) -> String {
        format!(
            "{}/contact-views/{}",
            self.config.base_url,
            urlencoding::encode(user_id)
        )
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }
        Ok(response)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let response = Self::check_status(response).await?;
        let body = response.json().await?;
        Ok(body)
    }
}
