//! Identity Verification Client
//!
//! Runs the end-to-end interactive verification flow against a
//! discovery-driven OIDC provider (MitID via a broker) and yields either a
//! fully verified [`IdentityClaim`] or a classified [`VerifyError`].
//!
//! ## Flow
//!
//! 1. Fetch the provider's discovery document (cached for the process
//!    lifetime)
//! 2. Build an authorization request with a fresh PKCE pair
//! 3. Present it through an [`InteractiveAgent`] (browser/webview owned by
//!    the host application) and classify the terminal result
//! 4. Exchange the authorization code plus the PKCE verifier for tokens
//! 5. Decode the id token and check its expiry
//!
//! This is the sole boundary that converts heterogeneous failures
//! (network, parsing, user action) into the closed six-code taxonomy;
//! callers branch on [`VerifyErrorCode`], never on message text.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Args;

use super::pkce::PkcePair;
use super::token;

/// Sentinel subject for the unverified demo identity path
pub const DEMO_SUBJECT: &str = "demo-user-001";

// =============================================================================
// Errors
// =============================================================================

/// Failure fetching or parsing the provider discovery document
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Discovery request failed: {0}")]
    Http(String),

    #[error("Discovery endpoint returned status {0}")]
    Status(u16),

    #[error("Discovery document could not be parsed: {0}")]
    Parse(String),
}

/// Machine-readable verification failure codes.
///
/// `LoginCancelled` is recoverable and silent - the caller returns to the
/// pre-attempt state with no error surface. All other codes are reported
/// with a retry affordance and the demo fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyErrorCode {
    /// User closed the interactive login surface
    LoginCancelled,
    /// Provider-reported error, or a normalized network/parse failure
    AuthError,
    /// Interactive step succeeded but returned no authorization code
    NoCode,
    /// Token exchange returned no identity token
    NoToken,
    /// Identity token payload could not be decoded
    InvalidToken,
    /// Identity token was already expired when received
    ExpiredToken,
}

impl VerifyErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyErrorCode::LoginCancelled => "LOGIN_CANCELLED",
            VerifyErrorCode::AuthError => "AUTH_ERROR",
            VerifyErrorCode::NoCode => "NO_CODE",
            VerifyErrorCode::NoToken => "NO_TOKEN",
            VerifyErrorCode::InvalidToken => "INVALID_TOKEN",
            VerifyErrorCode::ExpiredToken => "EXPIRED_TOKEN",
        }
    }
}

impl fmt::Display for VerifyErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification failure: a machine-readable code plus a human-readable
/// message. Callers branch on the code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct VerifyError {
    pub code: VerifyErrorCode,
    pub message: String,
}

impl VerifyError {
    pub fn cancelled() -> Self {
        Self {
            code: VerifyErrorCode::LoginCancelled,
            message: "Login was cancelled".to_string(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            code: VerifyErrorCode::AuthError,
            message: message.into(),
        }
    }

    pub fn no_code() -> Self {
        Self {
            code: VerifyErrorCode::NoCode,
            message: "No authorization code received from the provider".to_string(),
        }
    }

    pub fn no_token() -> Self {
        Self {
            code: VerifyErrorCode::NoToken,
            message: "No identity token received from the provider".to_string(),
        }
    }

    pub fn invalid_token() -> Self {
        Self {
            code: VerifyErrorCode::InvalidToken,
            message: "Identity token from the provider could not be decoded".to_string(),
        }
    }

    pub fn expired_token() -> Self {
        Self {
            code: VerifyErrorCode::ExpiredToken,
            message: "Identity token from the provider has expired".to_string(),
        }
    }

    /// Recoverable and silent - no error banner, no modal.
    pub fn is_cancelled(&self) -> bool {
        self.code == VerifyErrorCode::LoginCancelled
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Result of a successful verification round-trip.
///
/// Created once per authentication, never mutated, held only in memory for
/// the session. The national identifier is sensitive: it is redacted from
/// `Debug` output and must never be written to durable storage.
#[derive(Clone)]
pub struct IdentityClaim {
    /// Opaque unique subject identifier from the provider
    pub subject: String,
    /// Full name, when the provider supplied it
    pub name: Option<String>,
    /// Birth date (ISO date string), when supplied
    pub birthdate: Option<String>,
    /// Jurisdiction-specific identifier (CPR reference). Sensitive.
    pub national_id: Option<String>,
    /// True only when the full exchange succeeded and the token was unexpired
    pub verified: bool,
    /// Token issued-at
    pub issued_at: DateTime<Utc>,
    /// Token expiry; the claim is discarded at session end regardless
    pub expires_at: DateTime<Utc>,
    /// The assurance level this verification was performed under
    pub assurance_level: String,
}

impl fmt::Debug for IdentityClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClaim")
            .field("subject", &self.subject)
            .field("name", &self.name)
            .field("verified", &self.verified)
            .field(
                "national_id",
                &self.national_id.as_ref().map(|_| "<redacted>"),
            )
            .field("assurance_level", &self.assurance_level)
            .finish_non_exhaustive()
    }
}

impl IdentityClaim {
    /// The unverified demo identity: lets users explore the app without a
    /// MitID credential. Never silently upgraded to verified.
    pub fn demo() -> Self {
        let now = Utc::now();
        Self {
            subject: DEMO_SUBJECT.to_string(),
            name: Some("Demo Bruger".to_string()),
            birthdate: None,
            national_id: None,
            verified: false,
            issued_at: now,
            expires_at: now + chrono::Duration::hours(24),
            assurance_level: "demo".to_string(),
        }
    }

    pub fn is_demo(&self) -> bool {
        self.subject == DEMO_SUBJECT
    }

    /// Build a verified claim from a raw identity token.
    ///
    /// Fails with `INVALID_TOKEN` when the payload cannot be decoded and
    /// `EXPIRED_TOKEN` when it is already expired at `now`. The requested
    /// assurance level is recorded when the token does not echo one back.
    pub fn from_id_token(
        id_token: &str,
        requested_acr: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, VerifyError> {
        let claims = token::decode_payload(id_token).ok_or_else(VerifyError::invalid_token)?;

        if token::is_expired(&claims, now) {
            return Err(VerifyError::expired_token());
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(VerifyError::invalid_token)?;
        let issued_at = Utc.timestamp_opt(claims.iat, 0).single().unwrap_or(now);

        Ok(Self {
            subject: claims.sub,
            name: claims.name,
            birthdate: claims.birthdate,
            national_id: claims.national_id,
            verified: true,
            issued_at,
            expires_at,
            assurance_level: claims.acr.unwrap_or_else(|| requested_acr.to_string()),
        })
    }
}

// =============================================================================
// Provider metadata and authorization request
// =============================================================================

/// Endpoint set from the provider's well-known discovery document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub jwks_uri: Option<String>,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

/// An authorization-code request with PKCE.
///
/// Carries the S256 challenge; the raw verifier stays here until
/// code-exchange time and is never placed in the URL.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub acr_values: String,
    pub ui_locales: String,
    pkce: PkcePair,
}

impl AuthorizationRequest {
    pub fn code_challenge(&self) -> &str {
        self.pkce.challenge()
    }

    pub fn code_verifier(&self) -> &str {
        self.pkce.verifier()
    }

    /// Render the full authorization URL for the interactive agent.
    pub fn authorize_url(&self, metadata: &ProviderMetadata) -> String {
        let scope = self.scopes.join(" ");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("code_challenge", self.pkce.challenge()),
            ("code_challenge_method", self.pkce.method()),
            ("acr_values", self.acr_values.as_str()),
            ("ui_locales", self.ui_locales.as_str()),
        ];

        // Infallible for string pairs
        let query = serde_urlencoded::to_string(params).unwrap_or_default();
        format!("{}?{}", metadata.authorization_endpoint, query)
    }
}

/// Terminal result of the interactive authentication step
#[derive(Debug, Clone)]
pub enum PromptResult {
    /// Provider redirected back; `code` may still be absent
    Success { code: Option<String> },
    /// User closed the login surface
    Cancelled,
    /// Provider-reported error
    Error { description: String },
}

/// The external interactive authentication surface (browser/webview).
///
/// The core supplies the request and awaits a terminal result; it does not
/// own the presentation. Cancellation is only possible at this step.
#[async_trait]
pub trait InteractiveAgent: Send + Sync {
    async fn prompt(
        &self,
        request: &AuthorizationRequest,
        metadata: &ProviderMetadata,
    ) -> PromptResult;
}

// =============================================================================
// Client
// =============================================================================

/// Shape of the provider's token-endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
    /// Present in the response but unused locally; the relay re-verifies
    /// server-side when configured
    #[serde(default)]
    #[allow(dead_code)]
    access_token: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// OIDC verification client with a process-lifetime discovery cache.
pub struct VerifyClient {
    config: Args,
    http: reqwest::Client,
    /// Discovery document, written once, read many times
    metadata: RwLock<Option<ProviderMetadata>>,
    /// Prevents concurrent discovery fetches
    discovering: Mutex<()>,
}

impl VerifyClient {
    /// Create a client for the configured provider.
    pub fn new(config: Args) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http,
            metadata: RwLock::new(None),
            discovering: Mutex::new(()),
        }
    }

    /// Create a client with pre-fetched discovery metadata (no network on
    /// first use). Also the seam tests use to avoid discovery I/O.
    pub fn with_metadata(config: Args, metadata: ProviderMetadata) -> Self {
        let mut client = Self::new(config);
        client.metadata = RwLock::new(Some(metadata));
        client
    }

    /// Fetch and cache the provider's discovery document.
    ///
    /// Cached after first success for the process lifetime; never re-fetched
    /// unless the process restarts.
    pub async fn fetch_provider_metadata(&self) -> Result<ProviderMetadata, DiscoveryError> {
        // Fast path
        {
            let cached = self.metadata.read().await;
            if let Some(ref m) = *cached {
                return Ok(m.clone());
            }
        }

        let _lock = self.discovering.lock().await;

        // Double-check after acquiring the lock
        {
            let cached = self.metadata.read().await;
            if let Some(ref m) = *cached {
                return Ok(m.clone());
            }
        }

        let url = self.config.discovery_url();
        debug!(url = %url, "fetching provider discovery document");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Status(response.status().as_u16()));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

        info!(issuer = %metadata.issuer, "provider discovery document cached");

        let mut cached = self.metadata.write().await;
        *cached = Some(metadata.clone());
        Ok(metadata)
    }

    /// Construct an authorization request with a fresh PKCE pair.
    pub fn build_authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: self.config.idp_client_id.clone(),
            redirect_uri: self.config.idp_redirect_uri.clone(),
            scopes: self.config.scope_list(),
            acr_values: self.config.idp_acr_values.clone(),
            ui_locales: self.config.idp_ui_locales.clone(),
            pkce: PkcePair::generate(),
        }
    }

    /// Run the full verification flow.
    ///
    /// Suspends awaiting discovery, the interactive result, and the token
    /// exchange; only the interactive step is cancellable (resolving to
    /// `LOGIN_CANCELLED`). The raw token never leaves this function.
    pub async fn authenticate(
        &self,
        agent: &dyn InteractiveAgent,
    ) -> Result<IdentityClaim, VerifyError> {
        let metadata = self
            .fetch_provider_metadata()
            .await
            .map_err(|e| VerifyError::auth(e.to_string()))?;

        let request = self.build_authorization_request();
        info!(acr = %request.acr_values, "presenting identity verification prompt");

        let code = match agent.prompt(&request, &metadata).await {
            PromptResult::Cancelled => {
                debug!("identity verification cancelled by user");
                return Err(VerifyError::cancelled());
            }
            PromptResult::Error { description } => {
                warn!(error = %description, "provider reported an authentication error");
                return Err(VerifyError::auth(description));
            }
            PromptResult::Success { code } => match code.filter(|c| !c.is_empty()) {
                Some(code) => code,
                None => return Err(VerifyError::no_code()),
            },
        };

        let tokens = self
            .exchange_code(&metadata, &code, request.code_verifier())
            .await?;

        let id_token = match tokens.id_token.filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return Err(VerifyError::no_token()),
        };

        let claim =
            IdentityClaim::from_id_token(&id_token, &self.config.idp_acr_values, Utc::now())?;

        info!(verified = claim.verified, "identity verification completed");
        Ok(claim)
    }

    /// Exchange the authorization code plus PKCE verifier for tokens.
    async fn exchange_code(
        &self,
        metadata: &ProviderMetadata,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, VerifyError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.idp_client_id.as_str()),
            ("redirect_uri", self.config.idp_redirect_uri.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(&metadata.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| VerifyError::auth(format!("Token exchange failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::auth(format!(
                "Token endpoint returned status {status}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| VerifyError::auth(format!("Token response could not be parsed: {e}")))
    }
}
