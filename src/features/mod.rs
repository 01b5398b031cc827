//! # Features
//!
//! Each feature lives in its own module with a versioned header.
//!
//! - contacts: contact records and read-only collaborator traits
//! - matching: month/day matching for birthdays and anniversaries
//! - messages: randomized greeting templates
//! - settings: per-user notification time and channel preferences
//! - channels: push and email adapters, platform capabilities
//! - dispatch: per-user check-and-notify cycle and the daily sweep
//! - reminders: per-user scheduler and registry
//! - feed: today's reminders for the in-app list

pub mod channels;
pub mod contacts;
pub mod dispatch;
pub mod feed;
pub mod matching;
pub mod messages;
pub mod reminders;
pub mod settings;

pub use channels::{
    CapabilityProvider, EmailChannel, PlatformSupport, PushChannel, StaticCapabilities,
};
pub use contacts::{Contact, ContactStore, UserDirectory};
pub use dispatch::{
    run_daily_sweep, Dispatch, DispatchLedger, DispatchResult, Dispatcher, SweepReport,
};
pub use feed::{share_link, ReminderFeed, TodayFeed};
pub use matching::{find_matches, OccasionKind, OccasionMatch};
pub use messages::{generate, Entropy, GenerateOptions, Occasion};
pub use reminders::{ReminderScheduler, SchedulerRegistry, SchedulerState};
pub use settings::{NotificationSettings, SettingsStore};
