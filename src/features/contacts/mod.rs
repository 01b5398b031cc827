//! # Contacts Feature
//!
//! Contact records and the read-only collaborator interfaces the reminder core
//! consumes. Contacts are created, edited and deleted elsewhere; the core only
//! lists them by owner.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A person whose birthday or anniversary the user wants to remember
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Opaque identifier, unique per owner
    pub id: String,

    /// User who owns this contact
    pub owner_id: String,

    /// Display name
    pub name: String,

    /// Birth date; only month/day are used for matching
    #[serde(default)]
    pub birthday: Option<NaiveDate>,

    #[serde(default)]
    pub anniversary: Option<NaiveDate>,

    /// Free-text personality notes
    #[serde(default)]
    pub personality: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

impl Contact {
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: name.into(),
            birthday: None,
            anniversary: None,
            personality: None,
            phone: None,
            email: None,
        }
    }

    pub fn with_birthday(mut self, birthday: NaiveDate) -> Self {
        self.birthday = Some(birthday);
        self
    }

    pub fn with_anniversary(mut self, anniversary: NaiveDate) -> Self {
        self.anniversary = Some(anniversary);
        self
    }
}

/// Read access to the contacts owned by a user
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Contact>>;
}

/// Identity lookups against the auth provider
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The user's verified email address, if they have one
    async fn verified_email(&self, user_id: &str) -> Result<Option<String>>;

    /// Every known user, whether or not they ever saved settings
    async fn list_user_ids(&self) -> Result<Vec<String>>;
}
