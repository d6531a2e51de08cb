//! Relay backend client
//!
//! Optional HTTP client for the TrygKode relay: server-side token
//! verification, contact sync, and check-in notifications. The core
//! works fully offline; everything here is only wired up when a relay
//! URL is configured.
//!
//! Code words never cross this boundary in cleartext - sync records
//! carry sealed envelopes produced by [`crypto`].

pub mod crypto;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Args;
use crate::contacts::{CodeType, Contact};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay returned status {status}")]
    Status { status: u16 },

    #[error("Crypto error: {0}")]
    Crypto(String),
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyTokenRequest<'a> {
    id_token: &'a str,
}

/// Session minted by the relay after it re-verifies the ID token
/// server-side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySession {
    pub session_token: String,
    pub user: RelayUser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayUser {
    pub uid: String,
    pub name: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// One contact in a sync upload. The code word travels sealed; the relay
/// stores the envelope without being able to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncContactRecord {
    pub id: Uuid,
    pub encrypted_code_word: String,
    pub contact_name: String,
    pub code_type: CodeType,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckInRequest<'a> {
    target_user_id: &'a str,
    sender_name: &'a str,
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the relay backend.
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from configuration; `None` when no relay URL is set
    /// (the core then runs fully offline).
    pub fn from_config(config: &Args) -> Option<Self> {
        config
            .relay_url
            .as_ref()
            .map(|url| Self::new(url.clone(), Duration::from_secs(config.http_timeout_secs)))
    }

    /// Ask the relay to verify an ID token server-side and mint a session.
    ///
    /// The client's own token decode is unverified by design; the relay
    /// performs the signature check against the provider's JWKS.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<RelaySession, RelayError> {
        let url = format!("{}/verifyIdToken", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&VerifyTokenRequest { id_token })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::Status {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<RelaySession>().await?)
    }

    /// Upload the contact collection, code words sealed.
    pub async fn sync_contacts(
        &self,
        session_token: &str,
        records: &[SyncContactRecord],
    ) -> Result<(), RelayError> {
        let url = format!("{}/syncContacts", self.base_url);
        debug!(count = records.len(), "syncing contacts to relay");

        let response = self
            .http
            .post(&url)
            .bearer_auth(session_token)
            .json(records)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Notify a contact that the user checked in. Fire-and-forget: a
    /// non-success status is logged, not surfaced; only dispatch failures
    /// are returned.
    pub async fn send_check_in(
        &self,
        session_token: &str,
        target_user_id: &str,
        sender_name: &str,
    ) -> Result<(), RelayError> {
        let url = format!("{}/sendCheckIn", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(session_token)
            .json(&CheckInRequest {
                target_user_id,
                sender_name,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "check-in notification rejected");
        }
        Ok(())
    }
}

/// Convert contacts into sync records, sealing every code word. Contacts
/// that have no code word yet are skipped.
pub fn seal_for_sync(
    key: &crypto::SealingKey,
    contacts: &[Contact],
) -> Result<Vec<SyncContactRecord>, RelayError> {
    contacts
        .iter()
        .filter(|c| !c.code_word.is_empty())
        .map(|c| {
            Ok(SyncContactRecord {
                id: c.id,
                encrypted_code_word: crypto::seal_code_word(key, &c.code_word)?,
                contact_name: c.name.clone(),
                code_type: c.code_type,
                created_at: c.created_at,
                expires_at: c.expires_at,
            })
        })
        .collect()
}
