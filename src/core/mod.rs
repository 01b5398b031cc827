//! # Core Module
//!
//! Configuration, clock and error taxonomy shared by every reminder feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add clock module so scheduling can run against simulated time
//! - 1.0.0: Initial creation with config and error modules

pub mod clock;
pub mod config;
pub mod error;

// Re-export commonly used items
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::{ChannelKind, ChannelOutcome, ReminderError};
