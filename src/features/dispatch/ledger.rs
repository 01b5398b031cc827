//! # Dispatch Ledger
//!
//! Records which (user, day, channel) combinations have already been delivered
//! so a notification goes out at most once per channel per day, no matter
//! whether the in-process scheduler or the daily sweep triggered it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashSet;

use crate::core::ChannelKind;

#[async_trait]
pub trait DispatchLedger: Send + Sync {
    /// Reserve the slot; `false` if it was already taken
    async fn claim(&self, user_id: &str, day: NaiveDate, channel: ChannelKind) -> Result<bool>;

    /// Give a slot back after a failed delivery so a later trigger may retry
    async fn release(&self, user_id: &str, day: NaiveDate, channel: ChannelKind) -> Result<()>;
}

type LedgerKey = (String, NaiveDate, ChannelKind);

/// Process-local ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    claimed: DashSet<LedgerKey>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, user_id: &str, day: NaiveDate, channel: ChannelKind) -> bool {
        self.claimed.contains(&(user_id.to_string(), day, channel))
    }
}

#[async_trait]
impl DispatchLedger for MemoryLedger {
    async fn claim(&self, user_id: &str, day: NaiveDate, channel: ChannelKind) -> Result<bool> {
        Ok(self.claimed.insert((user_id.to_string(), day, channel)))
    }

    async fn release(&self, user_id: &str, day: NaiveDate, channel: ChannelKind) -> Result<()> {
        self.claimed.remove(&(user_id.to_string(), day, channel));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_once_per_day_and_channel() {
        let ledger = MemoryLedger::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let next_day = day.succ_opt().unwrap();

        assert!(ledger.claim("u1", day, ChannelKind::Email).await.unwrap());
        assert!(!ledger.claim("u1", day, ChannelKind::Email).await.unwrap());
        assert!(ledger.claim("u1", day, ChannelKind::Push).await.unwrap());
        assert!(ledger.claim("u1", next_day, ChannelKind::Email).await.unwrap());
        assert!(ledger.claim("u2", day, ChannelKind::Email).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_allows_retry() {
        let ledger = MemoryLedger::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        assert!(ledger.claim("u1", day, ChannelKind::Push).await.unwrap());
        ledger.release("u1", day, ChannelKind::Push).await.unwrap();
        assert!(!ledger.contains("u1", day, ChannelKind::Push));
        assert!(ledger.claim("u1", day, ChannelKind::Push).await.unwrap());
    }
}
