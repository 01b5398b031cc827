//! # Date Matcher
//!
//! Decides whether a contact's birthday or anniversary falls on a given day and
//! how many years have passed since the original date.
//!
//! Matching compares month and day only. A Feb 29 date does not match in a
//! non-leap year: there is no Feb 28 or Mar 1 fallback.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::features::contacts::Contact;

/// Kind of date that matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccasionKind {
    Birthday,
    Anniversary,
}

impl std::fmt::Display for OccasionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OccasionKind::Birthday => write!(f, "birthday"),
            OccasionKind::Anniversary => write!(f, "anniversary"),
        }
    }
}

/// A contact whose occasion falls on the reference day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccasionMatch {
    pub contact: Contact,
    pub kind: OccasionKind,
    /// Age for birthdays, years married for anniversaries
    pub years: u32,
}

/// True when `candidate` and `reference` share month and day-of-month
pub fn matches(candidate: NaiveDate, reference: NaiveDate) -> bool {
    candidate.month() == reference.month() && candidate.day() == reference.day()
}

/// Whole years from `past` to `reference`, never negative
pub fn years_elapsed(past: NaiveDate, reference: NaiveDate) -> u32 {
    let mut years = reference.year() - past.year();
    if (reference.month(), reference.day()) < (past.month(), past.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Every birthday and anniversary in `contacts` that falls on `today`.
///
/// Birthday and anniversary are checked independently, so one contact can
/// produce two matches.
pub fn find_matches(contacts: &[Contact], today: NaiveDate) -> Vec<OccasionMatch> {
    let mut found = Vec::new();

    for contact in contacts {
        let dates = [
            (OccasionKind::Birthday, contact.birthday),
            (OccasionKind::Anniversary, contact.anniversary),
        ];
        for (kind, date) in dates {
            if let Some(date) = date {
                if matches(date, today) {
                    found.push(OccasionMatch {
                        contact: contact.clone(),
                        kind,
                        years: years_elapsed(date, today),
                    });
                }
            }
        }
    }

    found
}
