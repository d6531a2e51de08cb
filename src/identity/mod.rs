//! Identity verification for TrygKode
//!
//! Provides:
//! - Compact token payload decoding and expiry checks (no signature work;
//!   signature/issuer/audience verification belongs to the broker exchange
//!   or the server-side relay)
//! - PKCE verifier/challenge generation for the authorization-code flow
//! - The end-to-end OIDC verification client and its error taxonomy

pub mod client;
pub mod pkce;
pub mod token;

pub use client::{
    AuthorizationRequest, DiscoveryError, IdentityClaim, InteractiveAgent, PromptResult,
    ProviderMetadata, VerifyClient, VerifyError, VerifyErrorCode, DEMO_SUBJECT,
};
pub use pkce::PkcePair;
pub use token::{decode_payload, is_expired, TokenClaims};
