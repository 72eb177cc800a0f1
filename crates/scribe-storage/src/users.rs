//! User directory: maps a verified identity subject to a stable user id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use scribe_core::error::ScribeError;

use crate::db::Database;

/// Resolves verified subjects to user ids, creating users on first sight.
pub trait UserDirectory: Send + Sync {
    /// Return the user id for `subject`, creating the user if needed.
    /// Repeated calls with the same subject return the same id.
    fn get_or_create_user(&self, subject: &str) -> Result<String, ScribeError>;
}

/// SQLite-backed user directory (upsert on the unique subject column).
pub struct SqliteUserDirectory {
    db: Arc<Database>,
}

impl SqliteUserDirectory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl UserDirectory for SqliteUserDirectory {
    fn get_or_create_user(&self, subject: &str) -> Result<String, ScribeError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, subject, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(subject) DO NOTHING",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    subject,
                    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                ],
            )
            .map_err(|e| ScribeError::Storage(format!("Failed to upsert user: {}", e)))?;

            conn.query_row(
                "SELECT id FROM users WHERE subject = ?1",
                rusqlite::params![subject],
                |row| row.get(0),
            )
            .map_err(|e| ScribeError::Storage(format!("Failed to load user: {}", e)))
        })
    }
}

/// Process-local user directory.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<String, String>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn get_or_create_user(&self, subject: &str) -> Result<String, ScribeError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| ScribeError::Storage(format!("user lock poisoned: {}", e)))?;
        Ok(users
            .entry(subject.to_string())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directories() -> Vec<Box<dyn UserDirectory>> {
        vec![
            Box::new(MemoryUserDirectory::new()),
            Box::new(SqliteUserDirectory::new(Arc::new(
                Database::in_memory().unwrap(),
            ))),
        ]
    }

    #[test]
    fn test_same_subject_same_user() {
        for dir in directories() {
            let first = dir.get_or_create_user("auth0|abc").unwrap();
            let second = dir.get_or_create_user("auth0|abc").unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_distinct_subjects_distinct_users() {
        for dir in directories() {
            let a = dir.get_or_create_user("auth0|a").unwrap();
            let b = dir.get_or_create_user("auth0|b").unwrap();
            assert_ne!(a, b);
        }
    }
}
