//! Compact token codec
//!
//! Decodes the payload segment of a three-segment signed token (JWT shape)
//! without verifying the signature. Verification is delegated to the
//! broker's code exchange; locally decoded claims are only trusted as far
//! as the exchange that produced them.
//!
//! Structural failures return `None`, never an error - callers must treat
//! `None` as "untrusted/unusable".

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried in an identity token payload.
///
/// `sub` and `exp` are required; everything else is optional. The
/// jurisdiction-specific identifier arrives under the `dk.cpr` claim name
/// and is sensitive - it must never reach durable storage or logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Unique subject identifier from the provider
    pub sub: String,

    /// Expiry, seconds since epoch
    pub exp: i64,

    /// Issued-at, seconds since epoch
    #[serde(default)]
    pub iat: i64,

    /// Full name
    #[serde(default)]
    pub name: Option<String>,

    /// Birth date (ISO date string)
    #[serde(default)]
    pub birthdate: Option<String>,

    /// Jurisdiction-specific identifier (Danish CPR reference). Sensitive.
    #[serde(rename = "dk.cpr", default)]
    pub national_id: Option<String>,

    /// Token issuer
    #[serde(default)]
    pub iss: Option<String>,

    /// Audience
    #[serde(default)]
    pub aud: Option<String>,

    /// Assurance level the provider actually applied
    #[serde(default)]
    pub acr: Option<String>,
}

/// Decode the payload segment of a compact three-segment token.
///
/// Splits on `.`, requires exactly 3 segments, base64url-decodes the middle
/// segment and parses it as JSON. Returns `None` on any structural failure.
pub fn decode_payload(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// True iff the claims are expired at `now`.
///
/// `exp` is seconds since epoch; the comparison is done in milliseconds,
/// so a token is expired exactly at its expiry instant. The multiplication
/// saturates: `exp` is provider-controlled and an absurdly large value must
/// read as "far future", not overflow.
pub fn is_expired(claims: &TokenClaims, now: DateTime<Utc>) -> bool {
    now.timestamp_millis() >= claims.exp.saturating_mul(1000)
}
