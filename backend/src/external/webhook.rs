//! Webhook delivery client
//!
//! Posts change events to an automation platform endpoint. Delivery is
//! strictly best-effort; callers decide what a failure means.

use serde::Serialize;

use crate::config::WebhookConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build webhook client: {}", e)))?;

        Ok(Self {
            client,
            url: config
                .url
                .as_ref()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        })
    }

    /// An unset URL means the webhook integration is simply turned off
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Deliver a JSON payload; only a 2xx response counts as success
    pub async fn send<T: Serialize>(&self, payload: &T) -> AppResult<()> {
        let url = self
            .url
            .as_ref()
            .ok_or_else(|| AppError::ExternalConfig("webhook.url is not configured".to_string()))?;

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ExternalTransport(format!("webhook request timed out: {}", e))
                } else {
                    AppError::ExternalTransport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalTransport(format!(
                "webhook returned HTTP {}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>) -> WebhookConfig {
        WebhookConfig {
            url: url.map(|u| u.to_string()),
            timeout_secs: 10,
        }
    }

    #[test]
    fn unset_url_means_not_configured() {
        let client = WebhookClient::new(&config(None)).unwrap();
        assert!(!client.is_configured());
    }

    #[test]
    fn blank_url_means_not_configured() {
        let client = WebhookClient::new(&config(Some("   "))).unwrap();
        assert!(!client.is_configured());
    }

    #[test]
    fn real_url_means_configured() {
        let client = WebhookClient::new(&config(Some("https://hooks.example.com/shop"))).unwrap();
        assert!(client.is_configured());
    }
}
