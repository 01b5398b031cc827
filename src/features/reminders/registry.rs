//! # Scheduler Registry
//!
//! Process-wide map of live schedulers keyed by user id. A user never has two
//! pending wake-ups: starting a user that already has a scheduler stops the old
//! one first.
//!
//! - **Version**: 1.1.0
//! - **Since**: 2.0.0
//!
//! ## Changelog
//! - 1.1.0: Bootstrap covers directory users that never saved settings
//! - 1.0.0: Initial release

use anyhow::Result;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::ReminderError;
use crate::features::contacts::UserDirectory;
use crate::features::settings::effective_settings;

use super::scheduler::{ReminderScheduler, SchedulerHandle, SchedulerState};

pub struct SchedulerRegistry {
    scheduler: ReminderScheduler,
    users: Arc<dyn UserDirectory>,
    handles: DashMap<String, SchedulerHandle>,
    // Serializes start/stop so a replace is never interleaved with another
    lifecycle: Mutex<()>,
}

impl SchedulerRegistry {
    pub fn new(scheduler: ReminderScheduler, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            scheduler,
            users,
            handles: DashMap::new(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Schedule `user_id`, replacing any scheduler it already has
    pub async fn start(&self, user_id: &str) -> Result<SchedulerState, ReminderError> {
        let _guard = self.lifecycle.lock().await;

        if let Some((_, previous)) = self.handles.remove(user_id) {
            debug!("Replacing existing scheduler for {}", user_id);
            previous.stop().await;
        }

        let handle = self.scheduler.start(user_id).await?;
        let state = handle.state();
        self.handles.insert(user_id.to_string(), handle);
        Ok(state)
    }

    /// Cancel the user's scheduler; `false` if none was running
    pub async fn stop(&self, user_id: &str) -> bool {
        let _guard = self.lifecycle.lock().await;

        match self.handles.remove(user_id) {
            Some((_, handle)) => {
                handle.stop().await;
                info!("Reminders disabled for {}", user_id);
                true
            }
            None => false,
        }
    }

    /// Pick up changed settings. Stops the scheduler when nothing can be
    /// delivered any more.
    pub async fn restart(&self, user_id: &str) -> Result<SchedulerState, ReminderError> {
        match self.start(user_id).await {
            Ok(state) => Ok(state),
            Err(e) => {
                self.stop(user_id).await;
                Err(e)
            }
        }
    }

    pub fn state(&self, user_id: &str) -> SchedulerState {
        self.handles
            .get(user_id)
            .map(|handle| handle.state())
            .unwrap_or(SchedulerState::Unscheduled)
    }

    pub fn active_users(&self) -> Vec<String> {
        self.handles
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub async fn stop_all(&self) {
        let _guard = self.lifecycle.lock().await;

        let users: Vec<String> = self.handles.iter().map(|entry| entry.key().clone()).collect();
        for user_id in users {
            if let Some((_, handle)) = self.handles.remove(&user_id) {
                handle.stop().await;
            }
        }
        info!("All reminder schedulers stopped");
    }

    /// Start-up transition: schedule every known user with a usable channel.
    ///
    /// Returns how many schedulers were started.
    pub async fn bootstrap(&self) -> Result<usize> {
        let store = self.scheduler.settings_store();
        let mut started = 0;

        for settings in effective_settings(self.users.as_ref(), store.as_ref()).await? {
            if !settings.any_channel_enabled() {
                continue;
            }
            match self.start(&settings.user_id).await {
                Ok(_) => started += 1,
                Err(ReminderError::PermissionDenied) => {
                    debug!("Skipping {}: push permission not granted", settings.user_id)
                }
                Err(e) => {
                    warn!("Could not schedule reminders for {}: {}", settings.user_id, e)
                }
            }
        }

        info!("Scheduled reminders for {} user(s)", started);
        Ok(started)
    }
}
