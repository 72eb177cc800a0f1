//! Transcript storage: an append-only, ordered log of turns per session.
//!
//! Two interchangeable backends sit behind `TranscriptStore`: SQLite
//! (durable) and a process-local in-memory map. The backend is chosen once
//! at startup by `open_transcript_store` and is fixed for the process
//! lifetime.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use scribe_core::config::StorageConfig;
use scribe_core::error::ScribeError;
use scribe_core::types::{Sender, Session, Turn};

use crate::db::Database;
use crate::users::{MemoryUserDirectory, SqliteUserDirectory, UserDirectory};

/// Ordered per-session turn log.
///
/// `read_all` returns turns in append order and an empty vector for an
/// unknown session id.
pub trait TranscriptStore: Send + Sync {
    /// Create and persist a new session owned by `user_id`.
    fn create_session(&self, user_id: &str, form_type: &str) -> Result<Session, ScribeError>;

    /// Append one turn to the end of the session's log.
    fn append(&self, session_id: &str, sender: Sender, message: &str)
        -> Result<Turn, ScribeError>;

    /// All turns of the session in append order.
    fn read_all(&self, session_id: &str) -> Result<Vec<Turn>, ScribeError>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

// =============================================================================
// Backend selection
// =============================================================================

/// Which transcript backend the process runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ScribeError::Config(format!(
                "Invalid storage backend '{}'. Must be one of: sqlite, memory",
                other
            ))),
        }
    }
}

/// Stores opened for the process.
pub struct StorageHandles {
    pub backend: StorageBackend,
    pub transcripts: Arc<dyn TranscriptStore>,
    pub users: Arc<dyn UserDirectory>,
}

/// Open the configured backend.
///
/// An unknown backend name is a configuration error. A SQLite database
/// that cannot be opened degrades the whole process to the in-memory
/// backend.
pub fn open_transcript_store(
    config: &StorageConfig,
    data_dir: &Path,
) -> Result<StorageHandles, ScribeError> {
    let requested: StorageBackend = config.backend.parse()?;

    if requested == StorageBackend::Sqlite {
        let db_path = data_dir.join(&config.db_file);
        match Database::new(&db_path) {
            Ok(db) => {
                let db = Arc::new(db);
                info!(path = %db_path.display(), "Transcript store: sqlite");
                return Ok(StorageHandles {
                    backend: StorageBackend::Sqlite,
                    transcripts: Arc::new(SqliteTranscriptStore::new(Arc::clone(&db))),
                    users: Arc::new(SqliteUserDirectory::new(db)),
                });
            }
            Err(e) => {
                warn!(
                    path = %db_path.display(),
                    error = %e,
                    "SQLite unavailable, falling back to in-memory transcripts for this process"
                );
            }
        }
    } else {
        info!("Transcript store: memory");
    }

    Ok(StorageHandles {
        backend: StorageBackend::Memory,
        transcripts: Arc::new(MemoryTranscriptStore::new()),
        users: Arc::new(MemoryUserDirectory::new()),
    })
}

// =============================================================================
// SQLite backend
// =============================================================================

/// Durable transcript store over the shared `Database`.
pub struct SqliteTranscriptStore {
    db: Arc<Database>,
}

impl SqliteTranscriptStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl TranscriptStore for SqliteTranscriptStore {
    fn create_session(&self, user_id: &str, form_type: &str) -> Result<Session, ScribeError> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            form_type: form_type.to_string(),
            created_at: Utc::now(),
        };
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, form_type, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    session.id,
                    session.user_id,
                    session.form_type,
                    format_ts(&session.created_at),
                ],
            )
            .map_err(|e| ScribeError::Storage(format!("Failed to create session: {}", e)))?;
            Ok(())
        })?;
        Ok(session)
    }

    fn append(
        &self,
        session_id: &str,
        sender: Sender,
        message: &str,
    ) -> Result<Turn, ScribeError> {
        let turn = Turn::now(session_id, sender, message);
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO turns (session_id, sender, message, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    turn.session_id,
                    turn.sender.as_str(),
                    turn.message,
                    format_ts(&turn.created_at),
                ],
            )
            .map_err(|e| ScribeError::Storage(format!("Failed to append turn: {}", e)))?;
            Ok(())
        })?;
        Ok(turn)
    }

    fn read_all(&self, session_id: &str) -> Result<Vec<Turn>, ScribeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT session_id, sender, message, created_at
                     FROM turns
                     WHERE session_id = ?1
                     ORDER BY seq ASC",
                )
                .map_err(|e| ScribeError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![session_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(|e| ScribeError::Storage(e.to_string()))?;

            let mut turns = Vec::new();
            for row in rows {
                let (session_id, sender, message, created_at) =
                    row.map_err(|e| ScribeError::Storage(e.to_string()))?;
                turns.push(Turn {
                    session_id,
                    sender: sender.parse()?,
                    message,
                    created_at: parse_ts(&created_at)?,
                });
            }
            Ok(turns)
        })
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, ScribeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScribeError::Storage(format!("Invalid timestamp '{}': {}", raw, e)))
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Process-local transcript store.
///
/// One mutex guards the whole turn map, so concurrent appends to the same
/// session never corrupt its list.
#[derive(Default)]
pub struct MemoryTranscriptStore {
    turns: Mutex<HashMap<String, Vec<Turn>>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any turn has been appended under `session_id`.
    pub fn contains_session(&self, session_id: &str) -> bool {
        self.turns
            .lock()
            .map(|turns| turns.contains_key(session_id))
            .unwrap_or(false)
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn create_session(&self, user_id: &str, form_type: &str) -> Result<Session, ScribeError> {
        Ok(Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            form_type: form_type.to_string(),
            created_at: Utc::now(),
        })
    }

    fn append(
        &self,
        session_id: &str,
        sender: Sender,
        message: &str,
    ) -> Result<Turn, ScribeError> {
        let turn = Turn::now(session_id, sender, message);
        let mut turns = self
            .turns
            .lock()
            .map_err(|e| ScribeError::Storage(format!("transcript lock poisoned: {}", e)))?;
        turns
            .entry(session_id.to_string())
            .or_default()
            .push(turn.clone());
        Ok(turn)
    }

    fn read_all(&self, session_id: &str) -> Result<Vec<Turn>, ScribeError> {
        let turns = self
            .turns
            .lock()
            .map_err(|e| ScribeError::Storage(format!("transcript lock poisoned: {}", e)))?;
        Ok(turns.get(session_id).cloned().unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends() -> Vec<Box<dyn TranscriptStore>> {
        vec![
            Box::new(MemoryTranscriptStore::new()),
            Box::new(SqliteTranscriptStore::new(Arc::new(
                Database::in_memory().unwrap(),
            ))),
        ]
    }

    #[test]
    fn test_read_back_preserves_append_order() {
        for store in backends() {
            let session = store.create_session("user-1", "SNAP").unwrap();
            let messages = ["hello", "My name is Ana", "", "12 Main St", "done"];
            for (i, msg) in messages.iter().enumerate() {
                let sender = if i % 2 == 0 { Sender::User } else { Sender::Agent };
                store.append(&session.id, sender, msg).unwrap();
            }

            let turns = store.read_all(&session.id).unwrap();
            let read: Vec<&str> = turns.iter().map(|t| t.message.as_str()).collect();
            assert_eq!(read, messages, "backend {}", store.backend_name());
            assert_eq!(turns[0].sender, Sender::User);
            assert_eq!(turns[1].sender, Sender::Agent);
        }
    }

    #[test]
    fn test_unknown_session_reads_empty() {
        for store in backends() {
            assert!(store.read_all("never-created").unwrap().is_empty());
        }
    }

    #[test]
    fn test_sessions_are_partitioned() {
        for store in backends() {
            let a = store.create_session("u", "SNAP").unwrap();
            let b = store.create_session("u", "SNAP").unwrap();
            assert_ne!(a.id, b.id);
            store.append(&a.id, Sender::User, "for a").unwrap();
            store.append(&b.id, Sender::User, "for b").unwrap();

            let a_turns = store.read_all(&a.id).unwrap();
            assert_eq!(a_turns.len(), 1);
            assert_eq!(a_turns[0].message, "for a");
        }
    }

    #[test]
    fn test_append_without_session_row_is_accepted() {
        for store in backends() {
            store
                .append("local-u-snap-1-abcd", Sender::User, "hi")
                .unwrap();
            assert_eq!(store.read_all("local-u-snap-1-abcd").unwrap().len(), 1);
        }
    }

    #[test]
    fn test_sqlite_persists_session_row() {
        let db = Arc::new(Database::in_memory().unwrap());
        let store = SqliteTranscriptStore::new(Arc::clone(&db));
        let created = store.create_session("user-9", "SNAP").unwrap();

        let (user_id, form_type): (String, String) = db
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT user_id, form_type FROM sessions WHERE id = ?1",
                    rusqlite::params![created.id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(|e| ScribeError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(user_id, "user-9");
        assert_eq!(form_type, "SNAP");
    }

    #[test]
    fn test_sqlite_timestamps_round_trip_to_millis() {
        let store = SqliteTranscriptStore::new(Arc::new(Database::in_memory().unwrap()));
        let appended = store.append("s", Sender::Agent, "hi").unwrap();
        let read = store.read_all("s").unwrap();
        assert_eq!(
            read[0].created_at.timestamp_millis(),
            appended.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_memory_concurrent_appends_keep_all_turns() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store
                            .append("shared", Sender::User, &format!("{}-{}", t, i))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(store.contains_session("shared"));
        assert!(!store.contains_session("other"));

        let turns = store.read_all("shared").unwrap();
        assert_eq!(turns.len(), 400);
        // Each writer's own turns stay in its append order.
        for t in 0..8 {
            let prefix = format!("{}-", t);
            let mine: Vec<usize> = turns
                .iter()
                .filter_map(|turn| turn.message.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(mine, (0..50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("postgres".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_open_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: "memory".to_string(),
            ..StorageConfig::default()
        };
        let handles = open_transcript_store(&config, dir.path()).unwrap();
        assert_eq!(handles.backend, StorageBackend::Memory);
        assert_eq!(handles.transcripts.backend_name(), "memory");
    }

    #[test]
    fn test_open_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let handles = open_transcript_store(&StorageConfig::default(), dir.path()).unwrap();
        assert_eq!(handles.backend, StorageBackend::Sqlite);
        assert!(dir.path().join("civicscribe.db").exists());
    }

    #[test]
    fn test_open_unreachable_sqlite_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be makes the open fail.
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let handles = open_transcript_store(&StorageConfig::default(), &blocker).unwrap();
        assert_eq!(handles.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_open_unknown_backend_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: "redis".to_string(),
            ..StorageConfig::default()
        };
        assert!(open_transcript_store(&config, dir.path()).is_err());
    }
}
