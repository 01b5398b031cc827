//! # Clock
//!
//! Wall-clock source used by the scheduler and dispatcher. All "today" and
//! "next firing" computations go through a [`Clock`] so they can be driven by
//! simulated time in tests.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local wall-clock time
    fn now(&self) -> NaiveDateTime;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);

    /// Current local calendar day
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local system time backed by tokio's timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
