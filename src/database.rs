//! # Database
//!
//! SQLite-backed implementations of the reminder collaborators: contacts,
//! notification settings, verified emails and the dispatch ledger. One
//! connection behind an async mutex, shared by cloning the handle.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Dispatch ledger table and contact import/export
//! - 1.0.0: Users, contacts and notification settings

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sqlite::{Connection, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::ChannelKind;
use crate::features::contacts::{Contact, ContactStore, UserDirectory};
use crate::features::dispatch::DispatchLedger;
use crate::features::settings::{NotificationSettings, SettingsStore, DEFAULT_LEAD_DAYS};

const DATE_FORMAT: &str = "%Y-%m-%d";

const CONTACT_COLUMNS: &str =
    "id, owner_id, name, birthday, anniversary, personality, phone, email";

const SETTINGS_COLUMNS: &str = "user_id, notification_time, days_before_birthday, \
     days_before_anniversary, enable_email_notifications, enable_push_notifications";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

/// Contact shape used by import/export; ids and owners are assigned on import
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContactRecord {
    name: String,
    #[serde(default)]
    birthday: Option<NaiveDate>,
    #[serde(default)]
    anniversary: Option<NaiveDate>,
    #[serde(default)]
    personality: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        let connection = sqlite::open(database_path)
            .map_err(|e| anyhow!("Failed to open database {}: {}", database_path, e))?;
        let database = Database {
            connection: Arc::new(Mutex::new(connection)),
        };
        database.init_tables().await?;
        info!("Database ready at {}", database_path);
        Ok(database)
    }

    async fn init_tables(&self) -> Result<()> {
        let connection = self.connection.lock().await;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT,
                email_verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
        )?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                birthday TEXT,
                anniversary TEXT,
                personality TEXT,
                phone TEXT,
                email TEXT,
                created_at TEXT NOT NULL
            )",
        )?;
        connection.execute("CREATE INDEX IF NOT EXISTS idx_contacts_owner ON contacts(owner_id)")?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS notification_settings (
                user_id TEXT PRIMARY KEY,
                notification_time TEXT NOT NULL DEFAULT '08:00:00',
                days_before_birthday TEXT NOT NULL DEFAULT '[7,3,1]',
                days_before_anniversary TEXT NOT NULL DEFAULT '[7,3,1]',
                enable_email_notifications INTEGER NOT NULL DEFAULT 1,
                enable_push_notifications INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL
            )",
        )?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS dispatch_log (
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                channel TEXT NOT NULL,
                sent_at TEXT NOT NULL,
                PRIMARY KEY (user_id, day, channel)
            )",
        )?;

        Ok(())
    }

    // User methods

    pub async fn upsert_user(
        &self,
        user_id: &str,
        email: Option<&str>,
        verified: bool,
    ) -> Result<()> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(
            "INSERT OR REPLACE INTO users (id, email, email_verified, created_at) \
             VALUES (?, ?, ?, ?)",
        )?;
        statement.bind((1, user_id))?;
        statement.bind((2, email))?;
        statement.bind((3, verified as i64))?;
        statement.bind((4, Utc::now().to_rfc3339().as_str()))?;
        statement.next()?;
        Ok(())
    }

    // Contact methods

    /// Insert a contact, assigning a fresh id when it has none
    pub async fn add_contact(&self, contact: &Contact) -> Result<String> {
        let id = if contact.id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            contact.id.clone()
        };

        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(format!(
            "INSERT INTO contacts ({}, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            CONTACT_COLUMNS
        ))?;
        let birthday = contact.birthday.map(|d| d.format(DATE_FORMAT).to_string());
        let anniversary = contact.anniversary.map(|d| d.format(DATE_FORMAT).to_string());
        statement.bind((1, id.as_str()))?;
        statement.bind((2, contact.owner_id.as_str()))?;
        statement.bind((3, contact.name.as_str()))?;
        statement.bind((4, birthday.as_deref()))?;
        statement.bind((5, anniversary.as_deref()))?;
        statement.bind((6, contact.personality.as_deref()))?;
        statement.bind((7, contact.phone.as_deref()))?;
        statement.bind((8, contact.email.as_deref()))?;
        statement.bind((9, Utc::now().to_rfc3339().as_str()))?;
        statement.next()?;

        debug!("Added contact {} for {}", id, contact.owner_id);
        Ok(id)
    }

    pub async fn delete_contact(&self, owner_id: &str, contact_id: &str) -> Result<()> {
        let connection = self.connection.lock().await;
        let mut statement =
            connection.prepare("DELETE FROM contacts WHERE id = ? AND owner_id = ?")?;
        statement.bind((1, contact_id))?;
        statement.bind((2, owner_id))?;
        statement.next()?;
        Ok(())
    }

    /// All of `owner_id`'s contacts as a JSON array
    pub async fn export_contacts_json(&self, owner_id: &str) -> Result<String> {
        let records: Vec<ContactRecord> = self
            .list_by_owner(owner_id)
            .await?
            .into_iter()
            .map(|c| ContactRecord {
                name: c.name,
                birthday: c.birthday,
                anniversary: c.anniversary,
                personality: c.personality,
                phone: c.phone,
                email: c.email,
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Import a JSON array of contacts for `owner_id`. Returns how many were added.
    pub async fn import_contacts_json(&self, owner_id: &str, json: &str) -> Result<usize> {
        let records: Vec<ContactRecord> =
            serde_json::from_str(json).map_err(|e| anyhow!("Invalid contacts file: {}", e))?;

        let mut imported = 0;
        for record in records {
            if record.name.trim().is_empty() {
                warn!("Skipping imported contact without a name");
                continue;
            }
            let contact = Contact {
                id: String::new(),
                owner_id: owner_id.to_string(),
                name: record.name,
                birthday: record.birthday,
                anniversary: record.anniversary,
                personality: record.personality,
                phone: record.phone,
                email: record.email,
            };
            self.add_contact(&contact).await?;
            imported += 1;
        }

        info!("Imported {} contact(s) for {}", imported, owner_id);
        Ok(imported)
    }
}

fn read_date(statement: &Statement, column: &str) -> Result<Option<NaiveDate>> {
    let raw = statement.read::<Option<String>, _>(column)?;
    Ok(raw.and_then(|value| match NaiveDate::parse_from_str(&value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Ignoring malformed {} value '{}'", column, value);
            None
        }
    }))
}

fn read_contact(statement: &Statement) -> Result<Contact> {
    Ok(Contact {
        id: statement.read::<String, _>("id")?,
        owner_id: statement.read::<String, _>("owner_id")?,
        name: statement.read::<String, _>("name")?,
        birthday: read_date(statement, "birthday")?,
        anniversary: read_date(statement, "anniversary")?,
        personality: statement.read::<Option<String>, _>("personality")?,
        phone: statement.read::<Option<String>, _>("phone")?,
        email: statement.read::<Option<String>, _>("email")?,
    })
}

fn read_lead_days(statement: &Statement, column: &str) -> Result<Vec<u32>> {
    let raw = statement.read::<String, _>(column)?;
    Ok(serde_json::from_str(&raw).unwrap_or_else(|_| {
        warn!("Ignoring malformed {} value '{}'", column, raw);
        DEFAULT_LEAD_DAYS.to_vec()
    }))
}

/// Stored row as-is; normalization happens in the settings feature
fn read_settings(statement: &Statement) -> Result<NotificationSettings> {
    Ok(NotificationSettings {
        user_id: statement.read::<String, _>("user_id")?,
        notification_time: statement.read::<String, _>("notification_time")?,
        days_before_birthday: read_lead_days(statement, "days_before_birthday")?,
        days_before_anniversary: read_lead_days(statement, "days_before_anniversary")?,
        enable_email_notifications: statement.read::<i64, _>("enable_email_notifications")? != 0,
        enable_push_notifications: statement.read::<i64, _>("enable_push_notifications")? != 0,
    })
}

#[async_trait]
impl ContactStore for Database {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Contact>> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(format!(
            "SELECT {} FROM contacts WHERE owner_id = ? ORDER BY name",
            CONTACT_COLUMNS
        ))?;
        statement.bind((1, user_id))?;

        let mut contacts = Vec::new();
        while let State::Row = statement.next()? {
            contacts.push(read_contact(&statement)?);
        }
        Ok(contacts)
    }
}

#[async_trait]
impl UserDirectory for Database {
    async fn verified_email(&self, user_id: &str) -> Result<Option<String>> {
        let connection = self.connection.lock().await;
        let mut statement =
            connection.prepare("SELECT email FROM users WHERE id = ? AND email_verified = 1")?;
        statement.bind((1, user_id))?;

        if let State::Row = statement.next()? {
            let email = statement.read::<Option<String>, _>("email")?;
            return Ok(email.filter(|e| !e.trim().is_empty()));
        }
        Ok(None)
    }

    async fn list_user_ids(&self) -> Result<Vec<String>> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare("SELECT id FROM users ORDER BY id")?;

        let mut ids = Vec::new();
        while let State::Row = statement.next()? {
            ids.push(statement.read::<String, _>("id")?);
        }
        Ok(ids)
    }
}

#[async_trait]
impl SettingsStore for Database {
    async fn get(&self, user_id: &str) -> Result<Option<NotificationSettings>> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(format!(
            "SELECT {} FROM notification_settings WHERE user_id = ?",
            SETTINGS_COLUMNS
        ))?;
        statement.bind((1, user_id))?;

        if let State::Row = statement.next()? {
            return Ok(Some(read_settings(&statement)?));
        }
        Ok(None)
    }

    async fn upsert(&self, user_id: &str, settings: &NotificationSettings) -> Result<()> {
        let birthday_days = serde_json::to_string(&settings.days_before_birthday)?;
        let anniversary_days = serde_json::to_string(&settings.days_before_anniversary)?;

        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(format!(
            "INSERT OR REPLACE INTO notification_settings ({}, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            SETTINGS_COLUMNS
        ))?;
        statement.bind((1, user_id))?;
        statement.bind((2, settings.notification_time.as_str()))?;
        statement.bind((3, birthday_days.as_str()))?;
        statement.bind((4, anniversary_days.as_str()))?;
        statement.bind((5, settings.enable_email_notifications as i64))?;
        statement.bind((6, settings.enable_push_notifications as i64))?;
        statement.bind((7, Utc::now().to_rfc3339().as_str()))?;
        statement.next()?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<NotificationSettings>> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(format!(
            "SELECT {} FROM notification_settings ORDER BY user_id",
            SETTINGS_COLUMNS
        ))?;

        let mut rows = Vec::new();
        while let State::Row = statement.next()? {
            rows.push(read_settings(&statement)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl DispatchLedger for Database {
    async fn claim(&self, user_id: &str, day: NaiveDate, channel: ChannelKind) -> Result<bool> {
        let day = day.format(DATE_FORMAT).to_string();
        let connection = self.connection.lock().await;

        // Another process may hold the same slot; the primary key decides.
        let mut insert = connection.prepare(
            "INSERT OR IGNORE INTO dispatch_log (user_id, day, channel, sent_at) \
             VALUES (?, ?, ?, ?)",
        )?;
        insert.bind((1, user_id))?;
        insert.bind((2, day.as_str()))?;
        insert.bind((3, channel.as_str()))?;
        insert.bind((4, Utc::now().to_rfc3339().as_str()))?;
        insert.next()?;
        Ok(connection.change_count() == 1)
    }

    async fn release(&self, user_id: &str, day: NaiveDate, channel: ChannelKind) -> Result<()> {
        let day = day.format(DATE_FORMAT).to_string();
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare("DELETE FROM dispatch_log WHERE user_id = ? AND day = ? AND channel = ?")?;
        statement.bind((1, user_id))?;
        statement.bind((2, day.as_str()))?;
        statement.bind((3, channel.as_str()))?;
        statement.next()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::settings::{load_settings, repair_settings, save_settings};

    async fn memory_db() -> Database {
        Database::new(":memory:").await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_contacts_listed_by_owner() {
        let db = memory_db().await;
        db.add_contact(&Contact::new("", "u1", "Bob").with_anniversary(date(2010, 6, 1)))
            .await
            .unwrap();
        let ada_id = db
            .add_contact(&Contact::new("", "u1", "Ada").with_birthday(date(1990, 3, 15)))
            .await
            .unwrap();
        db.add_contact(&Contact::new("", "u2", "Eve")).await.unwrap();

        let contacts = db.list_by_owner("u1").await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Ada");
        assert_eq!(contacts[0].id, ada_id);
        assert_eq!(contacts[0].birthday, Some(date(1990, 3, 15)));
        assert_eq!(contacts[0].anniversary, None);
        assert_eq!(contacts[1].anniversary, Some(date(2010, 6, 1)));
        assert!(Uuid::parse_str(&ada_id).is_ok());

        db.delete_contact("u1", &ada_id).await.unwrap();
        assert_eq!(db.list_by_owner("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_round_trip_normalizes_time() {
        let db = memory_db().await;
        let mut settings = NotificationSettings::defaults_for("u1");
        settings.notification_time = "09:15".to_string();
        settings.days_before_birthday = vec![14, 1];
        settings.enable_push_notifications = false;

        save_settings(&db, "u1", settings).await.unwrap();
        let stored = db.get("u1").await.unwrap().unwrap();

        assert_eq!(stored.notification_time, "09:15:00");
        assert_eq!(stored.days_before_birthday, vec![14, 1]);
        assert_eq!(stored.days_before_anniversary, vec![7, 3, 1]);
        assert!(!stored.enable_push_notifications);
        assert!(stored.enable_email_notifications);
        assert_eq!(db.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_row_repaired() {
        let db = memory_db().await;
        let mut legacy = NotificationSettings::defaults_for("u1");
        legacy.notification_time = "07:30".to_string();
        db.upsert("u1", &legacy).await.unwrap();

        assert_eq!(load_settings(&db, "u1").await.notification_time, "07:30:00");
        repair_settings(&db, "u1").await.unwrap();
        assert_eq!(
            db.get("u1").await.unwrap().unwrap().notification_time,
            "07:30:00"
        );
    }

    #[tokio::test]
    async fn test_missing_settings_is_none() {
        let db = memory_db().await;
        assert!(db.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verified_email_only() {
        let db = memory_db().await;
        db.upsert_user("u1", Some("ada@example.com"), true).await.unwrap();
        db.upsert_user("u2", Some("bob@example.com"), false).await.unwrap();
        db.upsert_user("u3", None, true).await.unwrap();

        assert_eq!(
            db.verified_email("u1").await.unwrap(),
            Some("ada@example.com".to_string())
        );
        assert_eq!(db.verified_email("u2").await.unwrap(), None);
        assert_eq!(db.verified_email("u3").await.unwrap(), None);
        assert_eq!(db.verified_email("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ledger_claim_and_release() {
        let db = memory_db().await;
        let day = date(2024, 3, 15);

        assert!(db.claim("u1", day, ChannelKind::Email).await.unwrap());
        assert!(!db.claim("u1", day, ChannelKind::Email).await.unwrap());
        assert!(db.claim("u1", day, ChannelKind::Push).await.unwrap());

        db.release("u1", day, ChannelKind::Email).await.unwrap();
        assert!(db.claim("u1", day, ChannelKind::Email).await.unwrap());
    }

    #[tokio::test]
    async fn test_ledger_claim_contended_across_connections() {
        let path = std::env::temp_dir().join(format!("connectkeep-{}.db", Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();
        let day = date(2024, 3, 15);

        let first = Database::new(&path).await.unwrap();
        let second = Database::new(&path).await.unwrap();

        assert!(first.claim("u1", day, ChannelKind::Email).await.unwrap());
        // The slot is taken; the other connection sees "not claimed", not an error
        assert!(!second.claim("u1", day, ChannelKind::Email).await.unwrap());
        assert!(second.claim("u1", day, ChannelKind::Push).await.unwrap());

        drop(first);
        drop(second);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_list_user_ids_includes_users_without_settings() {
        let db = memory_db().await;
        db.upsert_user("u2", None, false).await.unwrap();
        db.upsert_user("u1", Some("ada@example.com"), true).await.unwrap();
        save_settings(&db, "u2", NotificationSettings::defaults_for("u2")).await.unwrap();

        assert_eq!(db.list_user_ids().await.unwrap(), vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_import_export_contacts() {
        let db = memory_db().await;
        let json = r#"[
            {"name": "Ada", "birthday": "1990-03-15", "phone": "+15550100"},
            {"name": "  "},
            {"name": "Sam & Alex", "anniversary": "2012-03-15"}
        ]"#;

        assert_eq!(db.import_contacts_json("u1", json).await.unwrap(), 2);
        let contacts = db.list_by_owner("u1").await.unwrap();
        assert!(contacts.iter().all(|c| c.owner_id == "u1" && !c.id.is_empty()));

        let exported = db.export_contacts_json("u1").await.unwrap();
        let other = memory_db().await;
        assert_eq!(
            other.import_contacts_json("u2", &exported).await.unwrap(),
            2
        );
        let copied = other.list_by_owner("u2").await.unwrap();
        assert_eq!(copied[0].birthday, Some(date(1990, 3, 15)));
        assert_eq!(copied[0].phone.as_deref(), Some("+15550100"));

        assert!(db.import_contacts_json("u1", "not json").await.is_err());
    }
}
