use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScribeError;

// =============================================================================
// Enums
// =============================================================================

/// Who authored a transcript turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The applicant.
    User,
    /// The interviewing agent.
    Agent,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Agent => "agent",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "agent" => Ok(Sender::Agent),
            other => Err(ScribeError::Serialization(format!(
                "unknown sender '{}'",
                other
            ))),
        }
    }
}

/// A component that failed while the request still completed.
///
/// Carried alongside a successful result so callers can see that the
/// answer was produced on a fallback path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// The transcript store rejected a read, write, or session creation.
    StoreUnavailable,
    /// The user directory could not resolve the verified subject.
    UserDirectoryUnavailable,
    /// The language model call failed; the fixed fallback reply was used.
    ModelUnavailable,
    /// Speech synthesis failed; no audio reference was produced.
    AudioUnavailable,
}

// =============================================================================
// Records
// =============================================================================

/// One interview session (one application being filled in).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier, also the transcript partition key.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Form being filled, e.g. "SNAP".
    pub form_type: String,
    pub created_at: DateTime<Utc>,
}

/// A single immutable message in a session transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub session_id: String,
    pub sender: Sender,
    /// Raw message text. May be empty.
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn now(session_id: impl Into<String>, sender: Sender, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sender,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// A value produced successfully, possibly on one or more fallback paths.
#[derive(Clone, Debug, PartialEq)]
pub struct Degraded<T> {
    pub value: T,
    pub degradations: Vec<Degradation>,
}

impl<T> Degraded<T> {
    /// A result produced without any fallback.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            degradations: Vec::new(),
        }
    }

    /// A result produced on the given fallback path.
    pub fn degraded(value: T, degradation: Degradation) -> Self {
        Self {
            value,
            degradations: vec![degradation],
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}
