//! # Push Channel
//!
//! Push notification delivery. The transport is opaque to the reminder core:
//! it hands a title, body and data payload to whatever [`PushChannel`] the
//! platform provides.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    /// Opaque payload, e.g. `{"url": "..."}`
    pub data: serde_json::Value,
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn show_notification(&self, user_id: &str, notification: &PushNotification) -> Result<()>;
}

#[derive(Serialize)]
struct PushRequest<'a> {
    user_id: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a serde_json::Value,
}

/// Posts notifications as JSON to a push gateway
#[derive(Clone)]
pub struct WebhookPushChannel {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookPushChannel {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build push client: {}", e))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PushChannel for WebhookPushChannel {
    async fn show_notification(
        &self,
        user_id: &str,
        notification: &PushNotification,
    ) -> Result<()> {
        let request = PushRequest {
            user_id,
            title: &notification.title,
            body: &notification.body,
            data: &notification.data,
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Push gateway returned {}: {}", status, body));
        }

        debug!("Push gateway accepted notification for {}", user_id);
        Ok(())
    }
}
