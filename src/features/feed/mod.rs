//! # Reminder Feed Feature
//!
//! Today's birthdays and anniversaries for the in-app reminder list, each with
//! a suggested greeting. Uses the same matcher as the dispatcher so the list
//! and the notifications never disagree.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Share links and per-day completion marks
//! - 1.0.0: Birthday and anniversary sections

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use dashmap::DashSet;
use log::debug;
use reqwest::Url;
use std::sync::{Arc, Mutex};

use crate::core::{Clock, SystemClock};
use crate::features::contacts::{Contact, ContactStore};
use crate::features::matching::{find_matches, OccasionKind, OccasionMatch};
use crate::features::messages::{generate, Entropy, GenerateOptions, Occasion, RngEntropy};

pub const SHARE_BASE_URL: &str = "https://wa.me/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub occasion: OccasionMatch,
    pub message: String,
    /// Marked as sent today
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayFeed {
    pub day: NaiveDate,
    pub birthdays: Vec<FeedEntry>,
    pub anniversaries: Vec<FeedEntry>,
}

impl TodayFeed {
    pub fn is_empty(&self) -> bool {
        self.birthdays.is_empty() && self.anniversaries.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.birthdays
            .iter()
            .chain(self.anniversaries.iter())
            .filter(|entry| !entry.completed)
            .count()
    }
}

pub struct ReminderFeed {
    contacts: Arc<dyn ContactStore>,
    clock: Arc<dyn Clock>,
    entropy: Mutex<Box<dyn Entropy + Send>>,
    completed: DashSet<(String, NaiveDate, String)>,
}

impl ReminderFeed {
    pub fn new(contacts: Arc<dyn ContactStore>) -> Self {
        Self {
            contacts,
            clock: Arc::new(SystemClock),
            entropy: Mutex::new(Box::new(RngEntropy::from_os())),
            completed: DashSet::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_entropy(mut self, entropy: Box<dyn Entropy + Send>) -> Self {
        self.entropy = Mutex::new(entropy);
        self
    }

    pub async fn today(&self, user_id: &str) -> Result<TodayFeed> {
        let day = self.clock.today();
        let contacts = self.contacts.list_by_owner(user_id).await?;

        let mut feed = TodayFeed {
            day,
            birthdays: Vec::new(),
            anniversaries: Vec::new(),
        };
        for occasion in find_matches(&contacts, day) {
            let message = self.message_for(&occasion.contact, occasion.kind.into(), day, false);
            let completed = self
                .completed
                .contains(&(user_id.to_string(), day, occasion.contact.id.clone()));
            let entry = FeedEntry {
                occasion,
                message,
                completed,
            };
            match entry.occasion.kind {
                OccasionKind::Birthday => feed.birthdays.push(entry),
                OccasionKind::Anniversary => feed.anniversaries.push(entry),
            }
        }

        debug!(
            "Feed for {} on {}: {} birthday(s), {} anniversary(ies)",
            user_id,
            day,
            feed.birthdays.len(),
            feed.anniversaries.len()
        );
        Ok(feed)
    }

    /// Flag a contact as handled for today. The entry stays in the feed.
    pub fn mark_sent(&self, user_id: &str, contact_id: &str) {
        let day = self.clock.today();
        self.completed
            .insert((user_id.to_string(), day, contact_id.to_string()));
    }

    /// A fresh greeting drawn from every template pool
    pub fn regenerate(&self, entry: &FeedEntry) -> String {
        let occasion: Occasion = entry.occasion.kind.into();
        self.message_for(&entry.occasion.contact, occasion, self.clock.today(), true)
    }

    fn message_for(
        &self,
        contact: &Contact,
        occasion: Occasion,
        day: NaiveDate,
        force_random: bool,
    ) -> String {
        let options = GenerateOptions { force_random };
        match self.entropy.lock() {
            Ok(mut entropy) => generate(contact, occasion, day, options, entropy.as_mut()),
            Err(poisoned) => {
                let mut entropy = poisoned.into_inner();
                generate(contact, occasion, day, options, entropy.as_mut())
            }
        }
    }
}

/// WhatsApp share link carrying `message`
pub fn share_link(message: &str) -> Result<String> {
    let url = Url::parse_with_params(SHARE_BASE_URL, &[("text", message)])
        .map_err(|e| anyhow!("Failed to build share link: {}", e))?;
    Ok(url.to_string())
}
