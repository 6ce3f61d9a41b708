// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Durable profile storage
//!
//! One row per stored profile. The analysis history is embedded in the row as a
//! JSON object keyed by timestamp, so replacing a row replaces the whole history
//! in a single statement.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::models::{AnalysisHistory, Profile};
use crate::{Result, TrackerError};

/// Row identifier generated by the database
pub type RowId = i64;

/// A profile together with the row it was read from
///
/// `id` is `None` for a profile that has never been written.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub id: Option<RowId>,
    pub profile: Profile,
}

impl StoredProfile {
    pub fn new(profile: Profile) -> Self {
        Self { id: None, profile }
    }
}

/// Keyed storage of profiles
pub trait ProfileStore: Send + Sync {
    /// Exact, case-sensitive match on all three identity fields
    fn find_by_identity(&self, name: &str, age: &str, gender: &str) -> Result<Option<StoredProfile>>;

    /// Write a full record, replacing the row with the same id if there is one
    fn upsert(&self, record: &StoredProfile) -> Result<RowId>;

    /// All profiles, most recently inserted first
    fn list_all(&self) -> Result<Vec<Profile>>;

    /// Remove a row. Returns whether a row was deleted.
    fn delete(&self, id: RowId) -> Result<bool>;
}

/// SQLite-backed profile store (thread-safe wrapper)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| TrackerError::LockPoisoned)
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age TEXT NOT NULL,
                gender TEXT NOT NULL,
                history TEXT NOT NULL DEFAULT '{}'
            );

            CREATE INDEX IF NOT EXISTS idx_profiles_identity ON user_profiles(name, age, gender);
        "#)?;
        Ok(())
    }

    /// Number of stored profiles
    pub fn profile_count(&self) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.query_row("SELECT COUNT(*) FROM user_profiles", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

impl ProfileStore for Database {
    fn find_by_identity(&self, name: &str, age: &str, gender: &str) -> Result<Option<StoredProfile>> {
        let conn = self.lock_conn()?;
        let found = conn
            .query_row(
                r#"SELECT id, name, age, gender, history FROM user_profiles
                   WHERE name = ?1 AND age = ?2 AND gender = ?3
                   ORDER BY id LIMIT 1"#,
                params![name, age, gender],
                stored_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn upsert(&self, record: &StoredProfile) -> Result<RowId> {
        let history = serde_json::to_string(&record.profile.history)?;
        let profile = &record.profile;
        let conn = self.lock_conn()?;

        let id = match record.id {
            Some(id) => {
                conn.execute(
                    r#"INSERT OR REPLACE INTO user_profiles (id, name, age, gender, history)
                       VALUES (?1, ?2, ?3, ?4, ?5)"#,
                    params![id, profile.name, profile.age, profile.gender, history],
                )?;
                id
            }
            None => {
                conn.execute(
                    r#"INSERT INTO user_profiles (name, age, gender, history)
                       VALUES (?1, ?2, ?3, ?4)"#,
                    params![profile.name, profile.age, profile.gender, history],
                )?;
                conn.last_insert_rowid()
            }
        };

        debug!("Wrote profile {} as row {} ({} analyses)", profile.key(), id, profile.history.len());
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<Profile>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, age, gender, history FROM user_profiles ORDER BY id DESC",
        )?;
        let profiles = stmt
            .query_map([], stored_from_row)?
            .map(|stored| stored.map(|s| s.profile))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }

    fn delete(&self, id: RowId) -> Result<bool> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM user_profiles WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredProfile> {
    let history_json: String = row.get(4)?;
    let history: AnalysisHistory = serde_json::from_str(&history_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(StoredProfile {
        id: Some(row.get(0)?),
        profile: Profile {
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            history,
        },
    })
}
