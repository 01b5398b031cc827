//! # Email Channel
//!
//! Email delivery through an HTTP send-email function that accepts
//! `{to, subject, message, html}` and a bearer token. Timeouts belong to the
//! adapter; callers only see success or an error.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::time::Duration;

use super::push::{PushChannel, PushNotification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    to: &'a str,
    subject: &'a str,
    message: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct HttpEmailChannel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpEmailChannel {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build email client: {}", e))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl EmailChannel for HttpEmailChannel {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        if email.to.trim().is_empty() || email.subject.is_empty() || email.text_body.is_empty() {
            return Err(anyhow!("Missing required fields: to, subject, or message"));
        }

        let request = SendEmailRequest {
            to: &email.to,
            subject: &email.subject,
            message: &email.text_body,
            html: &email.html_body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Email function returned {}: {}", status, body));
        }

        debug!("Email '{}' accepted for {}", email.subject, email.to);
        Ok(())
    }
}

/// Stand-in for a channel that has no transport configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredChannel;

#[async_trait]
impl EmailChannel for UnconfiguredChannel {
    async fn send(&self, _email: &OutgoingEmail) -> Result<()> {
        Err(anyhow!("email channel is not configured (set EMAIL_ENDPOINT)"))
    }
}

#[async_trait]
impl PushChannel for UnconfiguredChannel {
    async fn show_notification(
        &self,
        _user_id: &str,
        _notification: &PushNotification,
    ) -> Result<()> {
        Err(anyhow!("push channel is not configured (set PUSH_ENDPOINT)"))
    }
}
