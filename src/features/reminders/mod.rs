//! # Reminders Feature
//!
//! Daily reminder scheduling: one self-rescheduling task per user, held in a
//! registry with explicit start and stop.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

pub mod registry;
pub mod scheduler;

pub use registry::SchedulerRegistry;
pub use scheduler::{
    firing_after, format_countdown, next_firing, ReminderScheduler, SchedulerHandle, SchedulerState,
};
