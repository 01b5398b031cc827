//! # Delivery Channels Feature
//!
//! Push and email adapters plus the platform capability check that gates push.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.1.0: Email channel via HTTP send-email function
//! - 1.0.0: Push channel and capability provider

pub mod capability;
pub mod email;
pub mod push;

pub use capability::{CapabilityProvider, PlatformSupport, StaticCapabilities};
pub use email::{EmailChannel, HttpEmailChannel, OutgoingEmail, UnconfiguredChannel};
pub use push::{PushChannel, PushNotification, WebhookPushChannel};

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;

use crate::core::Config;

/// Push and email adapters for the configured transports. A transport that is
/// not configured gets an adapter that always fails.
pub fn from_config(config: &Config) -> Result<(Arc<dyn PushChannel>, Arc<dyn EmailChannel>)> {
    let push: Arc<dyn PushChannel> = match &config.push_endpoint {
        Some(endpoint) => {
            info!("Push gateway: {}", endpoint);
            Arc::new(WebhookPushChannel::new(endpoint.as_str(), config.push_timeout)?)
        }
        None => Arc::new(UnconfiguredChannel),
    };

    let email: Arc<dyn EmailChannel> = match (&config.email_endpoint, &config.email_api_key) {
        (Some(endpoint), Some(key)) => {
            info!("Email function: {}", endpoint);
            Arc::new(HttpEmailChannel::new(
                endpoint.as_str(),
                key.as_str(),
                config.email_timeout,
            )?)
        }
        _ => {
            warn!("EMAIL_ENDPOINT not set, email reminders will fail");
            Arc::new(UnconfiguredChannel)
        }
    };

    Ok((push, email))
}

/// Capabilities implied by the configuration
pub fn capabilities_from_config(config: &Config) -> StaticCapabilities {
    StaticCapabilities::new(config.platform_support(), config.push_permission_granted)
}
