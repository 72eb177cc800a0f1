//! Scribe Storage crate - transcript persistence and the user directory.
//!
//! Provides a WAL-mode SQLite database with migrations, the
//! `TranscriptStore` interface with SQLite and in-memory backends, and the
//! `UserDirectory` that maps verified subjects to user ids.

pub mod db;
pub mod migrations;
pub mod transcript;
pub mod users;

pub use db::Database;
pub use transcript::{
    open_transcript_store, MemoryTranscriptStore, SqliteTranscriptStore, StorageBackend,
    StorageHandles, TranscriptStore,
};
pub use users::{MemoryUserDirectory, SqliteUserDirectory, UserDirectory};
