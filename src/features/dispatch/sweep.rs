//! # Daily Sweep
//!
//! Server-side fallback for users whose in-app scheduler cannot run. Walks
//! every known user with email enabled and runs the same dispatch the
//! scheduler would, so a (user, day) pair gets identical treatment from
//! either path. Users who never saved settings count as having the defaults.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.1.0: Enumerate users from the directory, not only stored settings
//! - 1.0.0: Initial release

use anyhow::Result;
use log::info;

use crate::features::contacts::UserDirectory;
use crate::features::settings::{effective_settings, SettingsStore};

use super::dispatcher::{Dispatch, DispatchResult};

/// Totals from one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub users_checked: usize,
    pub emails_sent: usize,
    pub pushes_sent: usize,
    pub failures: usize,
    pub results: Vec<DispatchResult>,
}

/// Dispatch for every user whose settings enable email.
///
/// Only listing users or settings can fail; per-user failures are counted.
pub async fn run_daily_sweep(
    dispatcher: &dyn Dispatch,
    users: &dyn UserDirectory,
    settings: &dyn SettingsStore,
) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    for user in effective_settings(users, settings).await? {
        if !user.enable_email_notifications {
            continue;
        }

        let result = dispatcher.dispatch_for(&user.user_id).await;
        report.users_checked += 1;
        if result.email_sent {
            report.emails_sent += 1;
        }
        if result.push_sent {
            report.pushes_sent += 1;
        }
        if !result.delivery_errors().is_empty() {
            report.failures += 1;
        }
        report.results.push(result);
    }

    info!(
        "Daily sweep checked {} user(s): {} email(s), {} push(es), {} failure(s)",
        report.users_checked, report.emails_sent, report.pushes_sent, report.failures
    );
    Ok(report)
}
