//! # Date Matching Feature
//!
//! Month/day matching for birthdays and anniversaries.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod matcher;

pub use matcher::{find_matches, matches, years_elapsed, OccasionKind, OccasionMatch};
