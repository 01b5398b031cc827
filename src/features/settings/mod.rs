//! # Notification Settings Feature
//!
//! Per-user reminder time and channel preferences.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod store;

pub use store::{
    effective_settings, list_settings, load_settings, normalize_time, repair_settings,
    save_settings, NotificationSettings, SettingsStore, DEFAULT_LEAD_DAYS,
    DEFAULT_NOTIFICATION_TIME,
};
