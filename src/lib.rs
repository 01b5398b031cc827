// Core layer - shared types, configuration and clock
pub mod core;

// Features layer - reminder pipeline
pub mod features;

// Infrastructure - sqlite-backed collaborators
pub mod database;

#[cfg(test)]
pub(crate) mod test_support;

pub use core::{ChannelKind, ChannelOutcome, Clock, Config, ReminderError, SystemClock};
pub use database::Database;

pub use features::{
    // Dispatch
    run_daily_sweep, Dispatch, DispatchResult, Dispatcher, SweepReport,
    // Scheduling
    ReminderScheduler, SchedulerRegistry, SchedulerState,
    // Feed
    ReminderFeed, TodayFeed,
    // Collaborators
    Contact, ContactStore, NotificationSettings, SettingsStore, UserDirectory,
};
