//! Configuration for the TrygKode core
//!
//! CLI arguments and environment variable handling using clap.
//! The identity provider is a MitID broker speaking standard OIDC;
//! in test mode the broker's simulator accepts the `low` assurance level,
//! production requires `substantial` (real MitID).

use clap::Parser;

/// Default assurance level accepted by the broker's MitID simulator
pub const ACR_MITID_LOW: &str = "urn:grn:authn:dk:mitid:low";

/// Assurance level requiring a real MitID credential
pub const ACR_MITID_SUBSTANTIAL: &str = "urn:grn:authn:dk:mitid:substantial";

/// TrygKode core configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "trygkode-core")]
#[command(about = "Identity verification and contact trust core for TrygKode")]
pub struct Args {
    /// Identity broker domain (OIDC issuer host)
    #[arg(long, env = "IDP_DOMAIN", default_value = "trygkode-test.criipto.id")]
    pub idp_domain: String,

    /// OAuth client identifier registered with the broker
    #[arg(long, env = "IDP_CLIENT_ID", default_value = "urn:trygkode:test")]
    pub idp_client_id: String,

    /// Redirect URI the broker sends the authorization code back to
    #[arg(long, env = "IDP_REDIRECT_URI", default_value = "trygkode://auth/callback")]
    pub idp_redirect_uri: String,

    /// Requested scopes (comma-separated, must include "openid")
    #[arg(long, env = "IDP_SCOPES", default_value = "openid")]
    pub idp_scopes: String,

    /// Requested assurance level (acr_values)
    #[arg(long, env = "IDP_ACR_VALUES", default_value = ACR_MITID_LOW)]
    pub idp_acr_values: String,

    /// UI locale forwarded to the broker's login surface
    #[arg(long, env = "IDP_UI_LOCALES", default_value = "da")]
    pub idp_ui_locales: String,

    /// Timeout for discovery and token-exchange HTTP calls, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,

    /// Base URL of the server-side relay (token verification, contact sync,
    /// check-in notifications). Unset means client-side-only operation.
    #[arg(long, env = "RELAY_URL")]
    pub relay_url: Option<String>,

    /// Allow the unverified demo identity path (explore without MitID)
    #[arg(long, env = "DEMO_MODE", default_value = "true")]
    pub demo_mode: bool,

    /// Rotation period for rotating code words, in days
    #[arg(long, env = "CODE_ROTATION_DAYS", default_value = "30")]
    pub code_rotation_days: i64,
}

impl Args {
    /// Well-known OIDC discovery URL for the configured broker
    pub fn discovery_url(&self) -> String {
        format!(
            "https://{}/.well-known/openid-configuration",
            self.idp_domain
        )
    }

    /// Requested scopes as a list
    pub fn scope_list(&self) -> Vec<String> {
        self.idp_scopes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.idp_domain.is_empty() {
            return Err("IDP_DOMAIN must not be empty".to_string());
        }

        if self.idp_client_id.is_empty() {
            return Err("IDP_CLIENT_ID must not be empty".to_string());
        }

        if !self.scope_list().iter().any(|s| s == "openid") {
            return Err("IDP_SCOPES must include \"openid\"".to_string());
        }

        if self.code_rotation_days <= 0 {
            return Err("CODE_ROTATION_DAYS must be positive".to_string());
        }

        Ok(())
    }
}

impl Default for Args {
    fn default() -> Self {
        // Defaults mirror the declared clap defaults; parse_from keeps the
        // two in sync without repeating the literals.
        Args::parse_from(["trygkode-core"])
    }
}
