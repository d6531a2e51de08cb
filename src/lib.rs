//! TrygKode core - identity verification and contact trust
//!
//! TrygKode lets people establish shared secret code words with trusted
//! contacts, so a phone call claiming to be from a family member can be
//! checked against AI voice-cloning scams. This crate is the non-UI core:
//!
//! ## Components
//!
//! - **Identity**: OIDC authorization-code + PKCE verification against a
//!   discovery-driven provider (MitID via a broker), including the compact
//!   token codec and the closed error taxonomy screens branch on
//! - **Code words**: memorable static pass-phrases and short rotating codes
//! - **Contacts**: the trust-relationship state machine (request, accept,
//!   decline, rotate, check-in, remove)
//! - **Store**: process-wide application state with atomic mutations
//! - **Relay**: typed contracts for the server-side collaborators (token
//!   verification, encrypted contact sync, check-in notifications)
//!
//! The presentation layer consumes snapshots from [`store::AppStore`] and
//! dispatches user intents through its mutation methods; nothing outside
//! this crate mutates contacts directly.

pub mod codeword;
pub mod config;
pub mod contacts;
pub mod identity;
pub mod relay;
pub mod store;

pub use config::Args;
pub use contacts::{Contact, ContactAction, ContactStatus, TransitionError, TransitionOutcome};
pub use identity::{
    IdentityClaim, InteractiveAgent, PromptResult, VerifyClient, VerifyError, VerifyErrorCode,
};
pub use store::{AppStore, StoreError, UserProfile};
