//! In-memory collaborators shared by unit tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::core::{ChannelOutcome, Clock};
use crate::features::channels::{EmailChannel, OutgoingEmail, PushChannel, PushNotification};
use crate::features::contacts::{Contact, ContactStore, UserDirectory};
use crate::features::dispatch::{Dispatch, DispatchResult};
use crate::features::settings::{NotificationSettings, SettingsStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

#[derive(Default)]
pub struct MemorySettings {
    rows: DashMap<String, NotificationSettings>,
    failing: AtomicBool,
}

impl MemorySettings {
    /// Store a row as-is, skipping normalization
    pub fn insert_raw(&self, settings: NotificationSettings) {
        self.rows.insert(settings.user_id.clone(), settings);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("settings store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, user_id: &str) -> Result<Option<NotificationSettings>> {
        self.check()?;
        Ok(self.rows.get(user_id).map(|row| row.clone()))
    }

    async fn upsert(&self, user_id: &str, settings: &NotificationSettings) -> Result<()> {
        self.rows.insert(user_id.to_string(), settings.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<NotificationSettings>> {
        self.check()?;
        Ok(self.rows.iter().map(|row| row.value().clone()).collect())
    }
}

#[derive(Default)]
pub struct MemoryContacts {
    contacts: Mutex<Vec<Contact>>,
    failing: AtomicBool,
}

impl MemoryContacts {
    pub fn add(&self, contact: Contact) {
        self.contacts.lock().unwrap().push(contact);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContactStore for MemoryContacts {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Contact>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("contacts store unreachable"));
        }
        Ok(self
            .contacts
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.owner_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    emails: DashMap<String, String>,
}

impl MemoryUsers {
    pub fn set_email(&self, user_id: &str, email: &str) {
        self.emails.insert(user_id.to_string(), email.to_string());
    }
}

#[async_trait]
impl UserDirectory for MemoryUsers {
    async fn verified_email(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.emails.get(user_id).map(|e| e.clone()))
    }

    async fn list_user_ids(&self) -> Result<Vec<String>> {
        Ok(self.emails.iter().map(|entry| entry.key().clone()).collect())
    }
}

#[derive(Default)]
pub struct RecordingPush {
    sent: Mutex<Vec<(String, PushNotification)>>,
    failure: Mutex<Option<String>>,
}

impl RecordingPush {
    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<(String, PushNotification)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PushChannel for RecordingPush {
    async fn show_notification(
        &self,
        user_id: &str,
        notification: &PushNotification,
    ) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), notification.clone()));
        match self.failure.lock().unwrap().clone() {
            Some(reason) => Err(anyhow!(reason)),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    sent: Mutex<Vec<OutgoingEmail>>,
    failure: Mutex<Option<String>>,
}

impl RecordingEmail {
    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<OutgoingEmail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl EmailChannel for RecordingEmail {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        match self.failure.lock().unwrap().clone() {
            Some(reason) => Err(anyhow!(reason)),
            None => Ok(()),
        }
    }
}

/// Clock frozen at one instant
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn at(day: NaiveDate, hour: u32, minute: u32) -> Self {
        Self {
            now: day.and_hms_opt(hour, minute, 0).unwrap(),
        }
    }
}

#[async_trait]
impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wall clock that advances with tokio's (paused) time
pub struct PausedClock {
    wall_origin: NaiveDateTime,
    origin: Instant,
}

impl PausedClock {
    pub fn starting_at(wall_origin: NaiveDateTime) -> Self {
        Self {
            wall_origin,
            origin: Instant::now(),
        }
    }

    pub fn wall_time(&self, instant: Instant) -> NaiveDateTime {
        self.wall_origin + ChronoDuration::from_std(instant - self.origin).unwrap()
    }
}

#[async_trait]
impl Clock for PausedClock {
    fn now(&self) -> NaiveDateTime {
        self.wall_time(Instant::now())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Dispatch fake that records who was dispatched and when
pub struct RecordingDispatch {
    calls: Mutex<Vec<(String, Instant)>>,
    completed: AtomicUsize,
    delay: Option<Duration>,
    outcomes: Mutex<(ChannelOutcome, ChannelOutcome)>,
}

impl Default for RecordingDispatch {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            delay: None,
            outcomes: Mutex::new((ChannelOutcome::Sent, ChannelOutcome::Sent)),
        }
    }
}

impl RecordingDispatch {
    /// Each dispatch takes `delay` of simulated time
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond_with(&self, push: ChannelOutcome, email: ChannelOutcome) {
        *self.outcomes.lock().unwrap() = (push, email);
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn users(&self) -> Vec<String> {
        self.calls().into_iter().map(|(user, _)| user).collect()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispatch for RecordingDispatch {
    async fn dispatch_for(&self, user_id: &str) -> DispatchResult {
        self.calls
            .lock()
            .unwrap()
            .push((user_id.to_string(), Instant::now()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        let (push, email) = self.outcomes.lock().unwrap().clone();
        DispatchResult {
            user_id: user_id.to_string(),
            day: date(1970, 1, 1),
            push_sent: push.is_sent(),
            email_sent: email.is_sent(),
            match_count: 1,
            push,
            email,
        }
    }
}
