//! # Notification Dispatch Feature
//!
//! One check-and-notify cycle per user, the ledger that keeps it
//! at-most-once per channel and day, and the server-side daily sweep.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod compose;
pub mod dispatcher;
pub mod ledger;
pub mod sweep;

pub use compose::{compose_email, compose_push, compose_test_email, PUSH_TITLE};
pub use dispatcher::{Dispatch, DispatchResult, Dispatcher};
pub use ledger::{DispatchLedger, MemoryLedger};
pub use sweep::{run_daily_sweep, SweepReport};
