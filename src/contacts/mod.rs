//! Contact trust relationships
//!
//! A [`Contact`] is a trust relationship with another person, carrying the
//! shared code word once both parties have accepted. Status changes go
//! through [`apply_transition`] exclusively; the store never mutates a
//! contact's fields directly.

pub mod transitions;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use transitions::{apply_transition, ContactAction, TransitionError, TransitionOutcome};

/// Kind of shared secret for a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    /// Memorable pass-phrase, no expiry
    Static,
    /// Short code rotated on a fixed period
    Rotating,
}

/// Relationship status.
///
/// `declined` is transient: the store resolves a decline to removal rather
/// than retaining a tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// We initiated; awaiting the other party
    PendingSent,
    /// They initiated; we may accept or decline
    PendingReceived,
    /// Both parties agreed; code-word setup unlocked
    Accepted,
}

/// Which party initiated the relationship. Immutable once set; determines
/// which actions are offered (only the non-initiator accepts/declines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requester {
    Me,
    Them,
}

/// A trust relationship with another person.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Empty until code setup completes; always empty while pending
    pub code_word: String,
    pub code_type: CodeType,
    pub status: ContactStatus,

    pub created_at: DateTime<Utc>,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    pub requested_by: Requester,

    /// Only meaningful for rotating codes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_in: Option<DateTime<Utc>>,

    /// Bumped on every applied transition; used for optimistic
    /// concurrency when two UI surfaces race on the same contact
    #[serde(default)]
    pub version: u64,
}

impl Contact {
    /// Create a new pending request at `now`.
    ///
    /// `requested_by = Me` yields `pending_sent`; `Them` yields
    /// `pending_received` (remote-initiated, arriving through seed data or
    /// a future sync channel). The code word stays empty until accepted.
    pub fn new_request(
        name: impl Into<String>,
        phone: Option<String>,
        requested_by: Requester,
        now: DateTime<Utc>,
    ) -> Self {
        let status = match requested_by {
            Requester::Me => ContactStatus::PendingSent,
            Requester::Them => ContactStatus::PendingReceived,
        };

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone,
            code_word: String::new(),
            code_type: CodeType::Static,
            status,
            created_at: now,
            requested_at: now,
            accepted_at: None,
            requested_by,
            expires_at: None,
            last_check_in: None,
            version: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            ContactStatus::PendingSent | ContactStatus::PendingReceived
        )
    }

    /// Accepted but no code negotiated yet - a valid intermediate state
    pub fn awaiting_first_code(&self) -> bool {
        self.status == ContactStatus::Accepted && self.code_word.is_empty()
    }
}

/// A delegated identity a verified user administers for a dependent
/// (e.g. an elderly relative), with its own isolated contact collection.
///
/// The same contact invariants apply inside the nested collection, but all
/// transitions are performed by the administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedProfile {
    pub id: Uuid,
    pub name: String,
    pub relationship: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub contacts: Vec<Contact>,
}

impl ManagedProfile {
    pub fn new(
        name: impl Into<String>,
        relationship: impl Into<String>,
        phone: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            relationship: relationship.into(),
            phone,
            created_at: now,
            contacts: Vec::new(),
        }
    }
}
