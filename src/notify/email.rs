//! Email Notifier
//!
//! Sends key-usage alerts through SendGrid's v3 mail API.

use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{MonitorError, Result};
use crate::watch::Alert;

pub const SENDER_NAME: &str = "Sigstore Watcher";
pub const ALERT_SUBJECT: &str = "key usage detected by sigstore!";

#[derive(Debug, Clone)]
pub struct EmailNotifier {
    endpoint: String,
    api_key: String,
    recipient: String,
    http_client: Client,
}

impl EmailNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        recipient: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            recipient: recipient.into(),
            http_client,
        })
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub async fn send(&self, alert: &Alert) -> Result<()> {
        let message = json!({
            "personalizations": [{"to": [{"email": self.recipient}]}],
            "from": {"email": self.recipient, "name": SENDER_NAME},
            "subject": ALERT_SUBJECT,
            "content": [{"type": "text/plain", "value": alert_body(alert)}],
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| MonitorError::NotificationError(format!("send failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::NotificationError(format!(
                "mail API returned {}: {}",
                status, body
            )));
        }

        info!("Sent alert for index {} to {}", alert.index, self.recipient);
        debug!("mail API responded {}", status);
        Ok(())
    }
}

pub fn alert_body(alert: &Alert) -> String {
    format!(
        "ALERT!
Your public key was spotted by sigstore at index: {index} in the Sigstore Signature Transparency Log.
The key signed hash {hash} for signature {sig}.

You can see more details with:

rekor-cli get --log-index {index}

",
        index = alert.index,
        hash = alert.content_hash.as_deref().unwrap_or(""),
        sig = alert.signature.as_deref().unwrap_or(""),
    )
}
