//! # Reminder Errors
//!
//! Failure taxonomy for the notification path and the per-channel outcome
//! reported by every dispatch.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use serde::{Deserialize, Serialize};

/// Delivery channel for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Push,
    Email,
}

impl ChannelKind {
    /// Get the string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Push => "push",
            ChannelKind::Email => "email",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by the reminder subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// Platform notification permission not granted; disables the push path only
    PermissionDenied,
    /// Settings store could not be read
    SettingsUnavailable(String),
    /// A push or email adapter reported an error
    ChannelDeliveryFailure { channel: ChannelKind, reason: String },
    /// Neither push nor email can run for this user
    NoChannelsEnabled,
}

impl std::fmt::Display for ReminderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderError::PermissionDenied => {
                write!(f, "notification permission has not been granted")
            }
            ReminderError::SettingsUnavailable(reason) => {
                write!(f, "notification settings unavailable: {}", reason)
            }
            ReminderError::ChannelDeliveryFailure { channel, reason } => {
                write!(f, "{} delivery failed: {}", channel, reason)
            }
            ReminderError::NoChannelsEnabled => {
                write!(f, "no notification channel is enabled")
            }
        }
    }
}

impl std::error::Error for ReminderError {}

/// Result of one channel within one dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOutcome {
    /// Adapter accepted the notification
    Sent,
    /// Channel switched off in the user's settings
    Disabled,
    /// Push requested but the platform permission is missing
    PermissionDenied,
    /// Already delivered for this user and day
    AlreadySent,
    /// Nothing matched today, so nothing was sent
    NoMatches,
    /// Adapter error; recorded, never fatal
    Failed(String),
}

impl ChannelOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelOutcome::Sent)
    }

    /// Convert a failed outcome into the matching error, if any
    pub fn as_error(&self, channel: ChannelKind) -> Option<ReminderError> {
        match self {
            ChannelOutcome::Failed(reason) => Some(ReminderError::ChannelDeliveryFailure {
                channel,
                reason: reason.clone(),
            }),
            ChannelOutcome::PermissionDenied => Some(ReminderError::PermissionDenied),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelOutcome::Sent => write!(f, "sent"),
            ChannelOutcome::Disabled => write!(f, "disabled"),
            ChannelOutcome::PermissionDenied => write!(f, "permission denied"),
            ChannelOutcome::AlreadySent => write!(f, "already sent today"),
            ChannelOutcome::NoMatches => write!(f, "no matches"),
            ChannelOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
