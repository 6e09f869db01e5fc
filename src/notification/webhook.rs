//! A client for sending change notifications to a push-webhook endpoint.
//!
//! Wire format: a POST to `<base_url>/<topic>` with the plain-text message
//! as the body, the title in a `Title` header, and the machine tags
//! comma-joined in a `Tags` header. Non-2xx responses are errors to the
//! caller; the recorder logs them and moves on.

use crate::core::{Notification, NotificationSender};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error};

pub struct WebhookClient {
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookClient {
    /// Creates a client for the given base URL and topic.
    pub fn new(base_url: &str, topic: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self {
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), topic),
            client,
        })
    }
}

#[async_trait]
impl NotificationSender for WebhookClient {
    async fn send(&self, notification: &Notification) -> Result<()> {
        debug!(title = %notification.title, "Dispatching webhook notification");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Title", notification.title.clone())
            .header("Tags", notification.tags.join(","))
            .body(notification.body.clone())
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => Ok(()),
            Ok(res) => {
                let status = res.status();
                let body = res.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "Webhook endpoint rejected notification");
                bail!("webhook returned status {status}");
            }
            Err(e) => {
                error!(error = %e, "HTTP request to webhook endpoint failed");
                Err(e.into())
            }
        }
    }
}
