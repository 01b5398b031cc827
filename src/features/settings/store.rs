//! # Notification Settings
//!
//! Per-user notification preferences and the store interface they live behind.
//! Every read and write passes through time normalization: stored values have
//! historically been `HH:MM`, the core always works with `HH:MM:SS`.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Added repair for legacy rows and 12-hour display formatting
//! - 1.1.0: Fall back to defaults when the store is unreachable
//! - 1.0.0: Initial release with get/upsert

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};
use log::{debug, error, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::core::ReminderError;
use crate::features::contacts::UserDirectory;

pub const DEFAULT_NOTIFICATION_TIME: &str = "08:00:00";
pub const DEFAULT_LEAD_DAYS: [u32; 3] = [7, 3, 1];

static TIME_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn time_pattern() -> Option<&'static Regex> {
    TIME_PATTERN
        .get_or_init(|| match Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$") {
            Ok(re) => Some(re),
            Err(e) => {
                error!("Failed to compile notification time pattern: {}", e);
                None
            }
        })
        .as_ref()
}

fn default_time() -> String {
    DEFAULT_NOTIFICATION_TIME.to_string()
}

fn default_lead_days() -> Vec<u32> {
    DEFAULT_LEAD_DAYS.to_vec()
}

fn default_true() -> bool {
    true
}

/// One settings record per user, mirroring the persisted schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub user_id: String,

    /// Local time of the daily check, `HH:MM:SS` once normalized
    #[serde(default = "default_time")]
    pub notification_time: String,

    /// Lead times before a birthday. Stored but not used for matching yet.
    #[serde(default = "default_lead_days")]
    pub days_before_birthday: Vec<u32>,

    #[serde(default = "default_lead_days")]
    pub days_before_anniversary: Vec<u32>,

    #[serde(default = "default_true")]
    pub enable_email_notifications: bool,

    #[serde(default = "default_true")]
    pub enable_push_notifications: bool,
}

impl NotificationSettings {
    /// Defaults used when a user has never saved settings
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            notification_time: default_time(),
            days_before_birthday: default_lead_days(),
            days_before_anniversary: default_lead_days(),
            enable_email_notifications: true,
            enable_push_notifications: true,
        }
    }

    /// Copy with the time in `HH:MM:SS` form; unusable values become the default
    pub fn normalized(mut self) -> Self {
        match normalize_time(&self.notification_time) {
            Some(time) => {
                if time != self.notification_time {
                    debug!(
                        "Normalized notification time for {} from '{}' to '{}'",
                        self.user_id, self.notification_time, time
                    );
                }
                self.notification_time = time;
            }
            None => {
                warn!(
                    "Unusable notification time '{}' for {}, using {}",
                    self.notification_time, self.user_id, DEFAULT_NOTIFICATION_TIME
                );
                self.notification_time = default_time();
            }
        }
        self
    }

    /// Configured time of day; default time if the stored value is unusable
    pub fn time_of_day(&self) -> NaiveTime {
        normalize_time(&self.notification_time)
            .and_then(|t| NaiveTime::parse_from_str(&t, "%H:%M:%S").ok())
            .unwrap_or_else(|| NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default())
    }

    /// 12-hour rendering such as `8:00 AM`
    pub fn display_time(&self) -> String {
        let time = self.time_of_day();
        let (is_pm, hour12) = time.hour12();
        format!(
            "{}:{:02} {}",
            hour12,
            time.minute(),
            if is_pm { "PM" } else { "AM" }
        )
    }

    pub fn any_channel_enabled(&self) -> bool {
        self.enable_email_notifications || self.enable_push_notifications
    }
}

/// Normalize a stored time to `HH:MM:SS` with seconds zeroed.
///
/// `08:30` becomes `08:30:00`. Returns `None` for anything that is not a valid
/// time of day.
pub fn normalize_time(raw: &str) -> Option<String> {
    let caps = time_pattern()?.captures(raw.trim())?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    if let Some(seconds) = caps.get(3) {
        let seconds: u32 = seconds.as_str().parse().ok()?;
        if seconds > 59 {
            return None;
        }
    }
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(time.format("%H:%M:%S").to_string())
}

/// Persistence for notification settings, keyed by user id
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<NotificationSettings>>;

    /// Insert or replace the record for `user_id`; last write wins
    async fn upsert(&self, user_id: &str, settings: &NotificationSettings) -> Result<()>;

    /// Every stored record
    async fn list_all(&self) -> Result<Vec<NotificationSettings>>;
}

/// Load a user's settings, never failing.
///
/// A missing record yields the defaults; a store error is logged as
/// [`ReminderError::SettingsUnavailable`] and also yields the defaults.
pub async fn load_settings(store: &dyn SettingsStore, user_id: &str) -> NotificationSettings {
    match store.get(user_id).await {
        Ok(Some(settings)) => settings.normalized(),
        Ok(None) => {
            debug!("No notification settings for {}, using defaults", user_id);
            NotificationSettings::defaults_for(user_id)
        }
        Err(e) => {
            warn!(
                "{} (user {}), using defaults",
                ReminderError::SettingsUnavailable(e.to_string()),
                user_id
            );
            NotificationSettings::defaults_for(user_id)
        }
    }
}

/// Normalize and persist settings for `user_id`, returning what was written
pub async fn save_settings(
    store: &dyn SettingsStore,
    user_id: &str,
    settings: NotificationSettings,
) -> Result<NotificationSettings> {
    let mut settings = settings.normalized();
    settings.user_id = user_id.to_string();
    store.upsert(user_id, &settings).await?;
    info!(
        "Saved notification settings for {} (time {}, push {}, email {})",
        user_id,
        settings.notification_time,
        settings.enable_push_notifications,
        settings.enable_email_notifications
    );
    Ok(settings)
}

/// Rewrite a stored record in normalized form if it differs.
///
/// Returns the repaired record, or `None` when the user has no stored settings.
pub async fn repair_settings(
    store: &dyn SettingsStore,
    user_id: &str,
) -> Result<Option<NotificationSettings>> {
    let stored = match store.get(user_id).await? {
        Some(stored) => stored,
        None => return Ok(None),
    };

    let repaired = stored.clone().normalized();
    if repaired != stored {
        store.upsert(user_id, &repaired).await?;
        info!("Repaired notification settings for {}", user_id);
    }
    Ok(Some(repaired))
}

/// All stored settings, normalized
pub async fn list_settings(store: &dyn SettingsStore) -> Result<Vec<NotificationSettings>> {
    Ok(store
        .list_all()
        .await?
        .into_iter()
        .map(NotificationSettings::normalized)
        .collect())
}

/// Settings in effect for every known user, sorted by user id.
///
/// Users come from the directory and from stored rows. A user without a row
/// gets the defaults, the same as [`load_settings`] gives the dispatcher.
pub async fn effective_settings(
    directory: &dyn UserDirectory,
    store: &dyn SettingsStore,
) -> Result<Vec<NotificationSettings>> {
    let mut rows: BTreeMap<String, NotificationSettings> = list_settings(store)
        .await?
        .into_iter()
        .map(|settings| (settings.user_id.clone(), settings))
        .collect();

    for user_id in directory.list_user_ids().await? {
        rows.entry(user_id).or_insert_with_key(|user_id| {
            debug!("No notification settings for {}, using defaults", user_id);
            NotificationSettings::defaults_for(user_id)
        });
    }

    Ok(rows.into_values().collect())
}
