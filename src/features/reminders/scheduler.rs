//! # Reminder Scheduler
//!
//! One background task per user that sleeps until the configured local time,
//! runs a dispatch, and re-arms for the next day. Each task owns exactly one
//! pending wake-up; the next one is computed only after the dispatch returns.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Per-user tasks with watch-based cancellation and an injectable clock
//! - 1.1.0: Periodic cadence on platforms with background sync
//! - 1.0.0: Daily check at a fixed time

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::{Clock, ReminderError};
use crate::features::channels::CapabilityProvider;
use crate::features::dispatch::Dispatch;
use crate::features::settings::{load_settings, NotificationSettings, SettingsStore};

const PERIOD_HOURS: i64 = 24;

/// Where a user's scheduler currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Unscheduled,
    Scheduled { next_fire: NaiveDateTime },
    Firing,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Unscheduled => write!(f, "unscheduled"),
            SchedulerState::Scheduled { next_fire } => write!(f, "scheduled for {}", next_fire),
            SchedulerState::Firing => write!(f, "firing"),
        }
    }
}

/// How the next wake-up is derived after a firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cadence {
    /// Chain of one-shot wake-ups, re-read from settings every cycle
    OneShot,
    /// Fixed 24h registration starting at `anchor`; missed slots are skipped
    Periodic { anchor: NaiveDateTime },
}

/// Channels that can actually be delivered for a user right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveChannels {
    push: bool,
    email: bool,
}

/// Next firing instant: today at `time` if still ahead of `now`, else tomorrow
pub fn next_firing(now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(time);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Firing instant after one at `fired`: always the following day at `time`
pub fn firing_after(fired: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    (fired.date() + ChronoDuration::days(1)).and_time(time)
}

/// First periodic slot strictly after `now`
fn next_periodic_slot(anchor: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    if anchor > now {
        return anchor;
    }
    let period = ChronoDuration::hours(PERIOD_HOURS);
    let elapsed = (now - anchor).num_seconds();
    let periods = elapsed / period.num_seconds() + 1;
    anchor + period * periods as i32
}

/// Human-readable countdown such as `7 hours 30 minutes`
pub fn format_countdown(seconds: i64) -> String {
    fn unit(n: i64, name: &str) -> String {
        format!("{} {}{}", n, name, if n == 1 { "" } else { "s" })
    }

    let seconds = seconds.max(0);
    let (days, hours, minutes) = (
        seconds / 86_400,
        (seconds % 86_400) / 3_600,
        (seconds % 3_600) / 60,
    );
    match (days, hours, minutes) {
        (0, 0, 0) => unit(seconds, "second"),
        (0, 0, m) => unit(m, "minute"),
        (0, h, 0) => unit(h, "hour"),
        (0, h, m) => format!("{} {}", unit(h, "hour"), unit(m, "minute")),
        (d, 0, _) => unit(d, "day"),
        (d, h, _) => format!("{} {}", unit(d, "day"), unit(h, "hour")),
    }
}

/// Live scheduler task for one user
pub struct SchedulerHandle {
    user_id: String,
    cancel: watch::Sender<bool>,
    state: watch::Receiver<SchedulerState>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions
    pub fn watch(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the task to wind down.
    ///
    /// A pending wake-up never fires after this. A dispatch already running
    /// is allowed to finish but nothing is scheduled after it.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        if let Err(e) = self.task.await {
            error!("Scheduler task for {} ended abnormally: {}", self.user_id, e);
        }
    }
}

/// Builds per-user scheduler tasks
#[derive(Clone)]
pub struct ReminderScheduler {
    dispatcher: Arc<dyn Dispatch>,
    settings: Arc<dyn SettingsStore>,
    capabilities: Arc<dyn CapabilityProvider>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(
        dispatcher: Arc<dyn Dispatch>,
        settings: Arc<dyn SettingsStore>,
        capabilities: Arc<dyn CapabilityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dispatcher,
            settings,
            capabilities,
            clock,
        }
    }

    pub fn settings_store(&self) -> Arc<dyn SettingsStore> {
        self.settings.clone()
    }

    /// Enter `Scheduled` for `user_id` and spawn its wake-up loop.
    ///
    /// Fails with [`ReminderError::PermissionDenied`] when push is the only
    /// wanted channel and it cannot be delivered, and with
    /// [`ReminderError::NoChannelsEnabled`] when both channels are off.
    pub async fn start(&self, user_id: &str) -> Result<SchedulerHandle, ReminderError> {
        let settings = load_settings(self.settings.as_ref(), user_id).await;
        let channels = self.active_channels(user_id, &settings).await?;

        let now = self.clock.now();
        let first = next_firing(now, settings.time_of_day());
        let cadence = if channels.push && self.capabilities.support().periodic_sync() {
            Cadence::Periodic { anchor: first }
        } else {
            Cadence::OneShot
        };

        info!(
            "⏰ Reminders enabled for {} at {} (push {}, email {}, {}), next check in {}",
            user_id,
            settings.display_time(),
            channels.push,
            channels.email,
            match cadence {
                Cadence::OneShot => "one-shot",
                Cadence::Periodic { .. } => "periodic",
            },
            format_countdown((first - now).num_seconds())
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SchedulerState::Scheduled { next_fire: first });

        let scheduler = self.clone();
        let owner = user_id.to_string();
        let task = tokio::spawn(async move {
            scheduler.run(owner, cadence, first, cancel_rx, state_tx).await;
        });

        Ok(SchedulerHandle {
            user_id: user_id.to_string(),
            cancel: cancel_tx,
            state: state_rx,
            task,
        })
    }

    async fn active_channels(
        &self,
        user_id: &str,
        settings: &NotificationSettings,
    ) -> Result<ActiveChannels, ReminderError> {
        let push = settings.enable_push_notifications
            && self.capabilities.push_available(user_id).await;
        let email = settings.enable_email_notifications;

        if push || email {
            return Ok(ActiveChannels { push, email });
        }
        if settings.enable_push_notifications {
            warn!(
                "Push permission unavailable for {} ({}), staying unscheduled",
                user_id,
                self.capabilities.support()
            );
            return Err(ReminderError::PermissionDenied);
        }
        Err(ReminderError::NoChannelsEnabled)
    }

    async fn run(
        &self,
        user_id: String,
        cadence: Cadence,
        first: NaiveDateTime,
        mut cancel: watch::Receiver<bool>,
        state: watch::Sender<SchedulerState>,
    ) {
        let mut next = first;

        loop {
            let _ = state.send(SchedulerState::Scheduled { next_fire: next });

            let wait = (next - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                biased;
                _ = cancel.changed() => break,
                _ = self.clock.sleep(wait) => {}
            }
            if *cancel.borrow() {
                break;
            }
            if self.clock.now() < next {
                // Woke early; re-arm for the same instant
                continue;
            }

            let _ = state.send(SchedulerState::Firing);
            debug!("Firing reminder check for {} (due {})", user_id, next);
            let result = self.dispatcher.dispatch_for(&user_id).await;
            debug!(
                "Reminder check for {} done: {} match(es), push {}, email {}",
                user_id, result.match_count, result.push, result.email
            );

            if *cancel.borrow() {
                break;
            }

            let settings = load_settings(self.settings.as_ref(), &user_id).await;
            if let Err(e) = self.active_channels(&user_id, &settings).await {
                info!("Stopping reminders for {}: {}", user_id, e);
                break;
            }

            let now = self.clock.now();
            next = match cadence {
                Cadence::OneShot => {
                    let candidate = firing_after(next, settings.time_of_day());
                    if candidate > now {
                        candidate
                    } else {
                        next_firing(now, settings.time_of_day())
                    }
                }
                Cadence::Periodic { anchor } => next_periodic_slot(anchor, now),
            };
            info!(
                "Next reminder check for {} at {} (in {})",
                user_id,
                next,
                format_countdown((next - now).num_seconds())
            );
        }

        let _ = state.send(SchedulerState::Unscheduled);
        info!("Reminders for {} unscheduled", user_id);
    }
}
