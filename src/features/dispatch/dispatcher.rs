//! # Notification Dispatcher
//!
//! Runs one check-and-notify cycle for one user: load settings and contacts,
//! find today's birthdays and anniversaries, then fan out to push and email.
//! The two channels are independent; a failure on one never stops the other,
//! and nothing inside a dispatch escapes as an error.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Ledger-backed at-most-once delivery per channel and day
//! - 1.1.0: Email digest alongside the push summary
//! - 1.0.0: Initial release with push summary

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::core::config::DEFAULT_APP_URL;
use crate::core::{ChannelKind, ChannelOutcome, Clock, ReminderError, SystemClock};
use crate::features::channels::{CapabilityProvider, EmailChannel, PushChannel};
use crate::features::contacts::{ContactStore, UserDirectory};
use crate::features::matching::{find_matches, OccasionMatch};
use crate::features::messages::{Entropy, RngEntropy};
use crate::features::settings::{load_settings, NotificationSettings, SettingsStore};

use super::compose::{compose_email, compose_push, compose_test_email};
use super::ledger::{DispatchLedger, MemoryLedger};

/// Outcome of one dispatch for one user and day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub user_id: String,
    pub day: NaiveDate,
    pub push_sent: bool,
    pub email_sent: bool,
    pub match_count: usize,
    pub push: ChannelOutcome,
    pub email: ChannelOutcome,
}

impl DispatchResult {
    fn new(
        user_id: &str,
        day: NaiveDate,
        match_count: usize,
        push: ChannelOutcome,
        email: ChannelOutcome,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            day,
            push_sent: push.is_sent(),
            email_sent: email.is_sent(),
            match_count,
            push,
            email,
        }
    }

    /// Channels that tried to send and failed, push first
    pub fn delivery_errors(&self) -> Vec<ReminderError> {
        [(ChannelKind::Push, &self.push), (ChannelKind::Email, &self.email)]
            .into_iter()
            .filter(|(_, outcome)| matches!(outcome, ChannelOutcome::Failed(_)))
            .filter_map(|(channel, outcome)| outcome.as_error(channel))
            .collect()
    }
}

/// Anything that can run a dispatch for a user
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch_for(&self, user_id: &str) -> DispatchResult;
}

pub struct Dispatcher {
    contacts: Arc<dyn ContactStore>,
    settings: Arc<dyn SettingsStore>,
    users: Arc<dyn UserDirectory>,
    push: Arc<dyn PushChannel>,
    email: Arc<dyn EmailChannel>,
    capabilities: Arc<dyn CapabilityProvider>,
    ledger: Arc<dyn DispatchLedger>,
    clock: Arc<dyn Clock>,
    entropy: Mutex<Box<dyn Entropy + Send>>,
    app_url: String,
}

impl Dispatcher {
    pub fn new(
        contacts: Arc<dyn ContactStore>,
        settings: Arc<dyn SettingsStore>,
        users: Arc<dyn UserDirectory>,
        push: Arc<dyn PushChannel>,
        email: Arc<dyn EmailChannel>,
        capabilities: Arc<dyn CapabilityProvider>,
    ) -> Self {
        Self {
            contacts,
            settings,
            users,
            push,
            email,
            capabilities,
            ledger: Arc::new(MemoryLedger::new()),
            clock: Arc::new(SystemClock),
            entropy: Mutex::new(Box::new(RngEntropy::from_os())),
            app_url: DEFAULT_APP_URL.to_string(),
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn DispatchLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_entropy(mut self, entropy: Box<dyn Entropy + Send>) -> Self {
        self.entropy = Mutex::new(entropy);
        self
    }

    pub fn with_app_url(mut self, app_url: impl Into<String>) -> Self {
        self.app_url = app_url.into();
        self
    }

    /// Send the fixed test message to the user's verified address.
    ///
    /// Skips matching and the ledger; errors are returned to the caller.
    pub async fn send_test_email(&self, user_id: &str) -> Result<()> {
        let to = self
            .users
            .verified_email(user_id)
            .await?
            .ok_or_else(|| anyhow!("User {} has no verified email", user_id))?;
        self.email.send(&compose_test_email(&to)).await?;
        info!("Sent test email to {} for user {}", to, user_id);
        Ok(())
    }

    async fn push_outcome(
        &self,
        user_id: &str,
        day: NaiveDate,
        settings: &NotificationSettings,
        matches: &[OccasionMatch],
    ) -> ChannelOutcome {
        if !settings.enable_push_notifications {
            return ChannelOutcome::Disabled;
        }
        if !self.capabilities.push_available(user_id).await {
            debug!(
                "Push skipped for {}: platform {} / permission missing",
                user_id,
                self.capabilities.support()
            );
            return ChannelOutcome::PermissionDenied;
        }

        let notification = compose_push(matches, &self.app_url);
        let send = self.push.show_notification(user_id, &notification);
        self.deliver(user_id, day, ChannelKind::Push, send).await
    }

    async fn email_outcome(
        &self,
        user_id: &str,
        day: NaiveDate,
        settings: &NotificationSettings,
        matches: &[OccasionMatch],
    ) -> ChannelOutcome {
        if !settings.enable_email_notifications {
            return ChannelOutcome::Disabled;
        }

        let to = match self.users.verified_email(user_id).await {
            Ok(Some(to)) => to,
            Ok(None) => return ChannelOutcome::Failed("no verified email".to_string()),
            Err(e) => return ChannelOutcome::Failed(format!("user lookup failed: {}", e)),
        };

        let email = match self.entropy.lock() {
            Ok(mut entropy) => compose_email(&to, matches, day, &self.app_url, entropy.as_mut()),
            Err(poisoned) => {
                let mut entropy = poisoned.into_inner();
                compose_email(&to, matches, day, &self.app_url, entropy.as_mut())
            }
        };

        let send = self.email.send(&email);
        self.deliver(user_id, day, ChannelKind::Email, send).await
    }

    /// Claim the ledger slot, send, and give the slot back on failure.
    /// `send` is not polled unless the claim succeeds.
    async fn deliver<Fut>(
        &self,
        user_id: &str,
        day: NaiveDate,
        channel: ChannelKind,
        send: Fut,
    ) -> ChannelOutcome
    where
        Fut: Future<Output = Result<()>>,
    {
        match self.ledger.claim(user_id, day, channel).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("{} already sent to {} for {}", channel, user_id, day);
                return ChannelOutcome::AlreadySent;
            }
            Err(e) => {
                error!("Dispatch ledger unavailable for {} ({}): {}", user_id, channel, e);
                return ChannelOutcome::Failed(format!("dispatch ledger unavailable: {}", e));
            }
        }

        match send.await {
            Ok(()) => ChannelOutcome::Sent,
            Err(e) => {
                let outcome = ChannelOutcome::Failed(e.to_string());
                if let Some(err) = outcome.as_error(channel) {
                    warn!("Reminder for {} on {}: {}", user_id, day, err);
                }
                if let Err(release_err) = self.ledger.release(user_id, day, channel).await {
                    warn!(
                        "Failed to release {} slot for {} on {}: {}",
                        channel, user_id, day, release_err
                    );
                }
                outcome
            }
        }
    }
}

#[async_trait]
impl Dispatch for Dispatcher {
    async fn dispatch_for(&self, user_id: &str) -> DispatchResult {
        let day = self.clock.today();
        let settings = load_settings(self.settings.as_ref(), user_id).await;

        let contacts = match self.contacts.list_by_owner(user_id).await {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!("Could not load contacts for {}: {}", user_id, e);
                let failed = |enabled: bool| {
                    if enabled {
                        ChannelOutcome::Failed(format!("contacts unavailable: {}", e))
                    } else {
                        ChannelOutcome::Disabled
                    }
                };
                return DispatchResult::new(
                    user_id,
                    day,
                    0,
                    failed(settings.enable_push_notifications),
                    failed(settings.enable_email_notifications),
                );
            }
        };

        let matches = find_matches(&contacts, day);
        if matches.is_empty() {
            debug!("No birthdays or anniversaries today for {}", user_id);
            return DispatchResult::new(
                user_id,
                day,
                0,
                ChannelOutcome::NoMatches,
                ChannelOutcome::NoMatches,
            );
        }

        let (push, email) = tokio::join!(
            self.push_outcome(user_id, day, &settings, &matches),
            self.email_outcome(user_id, day, &settings, &matches),
        );

        info!(
            "Dispatched reminders for {} on {}: {} match(es), push {}, email {}",
            user_id,
            day,
            matches.len(),
            push,
            email
        );

        DispatchResult::new(user_id, day, matches.len(), push, email)
    }
}
