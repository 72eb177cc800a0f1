//! Session resolution and transcript routing.
//!
//! Sessions normally live in the configured transcript store. When the store
//! cannot create a session, a `local-` id is issued and its transcript is
//! kept in a process-local memory store. Turns the store rejects for a
//! stored session are held in the same memory store under the stored id,
//! and every later turn of that session follows them there, so a read
//! returns the stored turns followed by the held ones.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use scribe_core::error::ScribeError;
use scribe_core::types::{Degradation, Degraded, Sender, Turn};
use scribe_storage::{MemoryTranscriptStore, TranscriptStore};

/// Prefix of session ids issued while the store was unavailable.
pub const LOCAL_PREFIX: &str = "local-";

/// Outcome of session resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSession {
    pub id: String,
    /// Whether this call created the session.
    pub created: bool,
}

pub struct SessionManager {
    store: Arc<dyn TranscriptStore>,
    local: MemoryTranscriptStore,
    form_type: String,
    counter: AtomicU64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TranscriptStore>, form_type: impl Into<String>) -> Self {
        Self {
            store,
            local: MemoryTranscriptStore::new(),
            form_type: form_type.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    /// Name of the configured backend.
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn is_local(session_id: &str) -> bool {
        session_id.starts_with(LOCAL_PREFIX)
    }

    /// Return the supplied session id, or create a new session for `user_id`.
    ///
    /// A supplied id is trusted as-is; blank ids count as absent.
    pub fn resolve_or_create(
        &self,
        user_id: &str,
        supplied: Option<&str>,
    ) -> Degraded<ResolvedSession> {
        if let Some(id) = supplied.filter(|s| !s.trim().is_empty()) {
            return Degraded::clean(ResolvedSession {
                id: id.to_string(),
                created: false,
            });
        }

        match self.store.create_session(user_id, &self.form_type) {
            Ok(session) => {
                debug!(session_id = %session.id, user_id, "Created session");
                Degraded::clean(ResolvedSession {
                    id: session.id,
                    created: true,
                })
            }
            Err(e) => {
                let id = self.local_id(user_id);
                warn!(
                    error = %e,
                    session_id = %id,
                    "Transcript store could not create a session, using a local session"
                );
                Degraded::degraded(
                    ResolvedSession { id, created: true },
                    Degradation::StoreUnavailable,
                )
            }
        }
    }

    /// Append a turn. A failed write is logged and reported, never raised.
    pub fn append(&self, session_id: &str, sender: Sender, message: &str) -> Option<Degradation> {
        if Self::is_local(session_id) {
            return match self.local.append(session_id, sender, message) {
                Ok(_) => None,
                Err(e) => {
                    warn!(session_id, sender = %sender, error = %e, "Failed to append turn");
                    Some(Degradation::StoreUnavailable)
                }
            };
        }

        if self.local.contains_session(session_id) {
            return self.hold(session_id, sender, message);
        }

        match self.store.append(session_id, sender, message) {
            Ok(_) => None,
            Err(e) => {
                warn!(
                    session_id,
                    sender = %sender,
                    error = %e,
                    "Transcript store rejected turn, holding it in memory"
                );
                self.hold(session_id, sender, message)
            }
        }
    }

    /// Every turn of a session in append order. Unknown ids read as empty.
    pub fn transcript(&self, session_id: &str) -> Result<Vec<Turn>, ScribeError> {
        if Self::is_local(session_id) {
            return self.local.read_all(session_id);
        }

        let held = self.local.read_all(session_id)?;
        match self.store.read_all(session_id) {
            Ok(mut turns) => {
                turns.extend(held);
                Ok(turns)
            }
            Err(e) if !held.is_empty() => {
                warn!(
                    session_id,
                    error = %e,
                    held = held.len(),
                    "Transcript store unreadable, using turns held in memory"
                );
                Ok(held)
            }
            Err(e) => Err(e),
        }
    }

    /// Keep a turn of a stored session in memory. The turn is not durable.
    fn hold(&self, session_id: &str, sender: Sender, message: &str) -> Option<Degradation> {
        if let Err(e) = self.local.append(session_id, sender, message) {
            warn!(session_id, error = %e, "Failed to hold turn in memory");
        }
        Some(Degradation::StoreUnavailable)
    }

    fn local_id(&self, user_id: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let unique = Uuid::new_v4().simple().to_string();
        format!(
            "{}{}-{}-{}-{}",
            LOCAL_PREFIX,
            user_id,
            self.form_type,
            n,
            &unique[..8]
        )
    }
}
