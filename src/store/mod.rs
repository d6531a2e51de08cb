//! Application state store
//!
//! Process-wide state for the TrygKode core: session, user profile, the
//! contact collection and managed profiles. An explicit struct owned by
//! the application root and passed by reference - no global singleton -
//! so tests construct fresh state per test.
//!
//! Every mutation is synchronous and total: it succeeds or is rejected
//! deterministically by the trust state machine; there is no
//! partial-failure state. Mutations take `&mut self`, so ownership
//! serializes them; readers receive `&` snapshots. Contact mutations can
//! additionally be version-checked for the case of two UI surfaces racing
//! on the same contact.

pub mod pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::codeword;
use crate::config::Args;
use crate::contacts::{
    apply_transition, CodeType, Contact, ContactAction, ManagedProfile, Requester,
    TransitionError, TransitionOutcome,
};
use crate::identity::IdentityClaim;

// =============================================================================
// Errors
// =============================================================================

/// Rejected store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No active session")]
    NoSession,

    /// Demo identities may explore but not create trust relationships
    #[error("MitID verification is required for this action")]
    VerificationRequired,

    /// The demo identity path is switched off in configuration
    #[error("Demo mode is disabled")]
    DemoDisabled,

    #[error("Contact not found")]
    ContactNotFound,

    #[error("Managed profile not found")]
    ProfileNotFound,

    /// Another surface mutated the contact first
    #[error("Contact was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },

    /// Selecting PIN unlock without having configured a PIN
    #[error("A PIN must be set before selecting PIN unlock")]
    PinRequired,

    #[error("PIN error: {0}")]
    Pin(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

// =============================================================================
// User profile
// =============================================================================

/// How the user unlocks the app on return visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMethod {
    Biometric,
    Pin,
    IdentityProvider,
}

/// The local application identity bound to an identity claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub verified: bool,
    /// Subject identifier from the identity provider
    pub subject: String,
    pub unlock_method: UnlockMethod,
    /// Present only when PIN unlock has been configured; argon2 hash,
    /// never the cleartext PIN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    fn from_claim(claim: &IdentityClaim, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: claim.name.clone().unwrap_or_default(),
            phone: None,
            verified: claim.verified,
            subject: claim.subject.clone(),
            unlock_method: UnlockMethod::Biometric,
            pin_hash: None,
            created_at: now,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Process-wide application state. See module docs for the mutation
/// contract.
pub struct AppStore {
    onboarded: bool,
    has_seed_data: bool,
    session: Option<IdentityClaim>,
    user: Option<UserProfile>,
    contacts: Vec<Contact>,
    managed_profiles: Vec<ManagedProfile>,
    /// Whether the unverified demo identity path may start a session
    demo_enabled: bool,
    /// Validity window for rotating codes, in days
    rotation_days: i64,
}

impl Default for AppStore {
    fn default() -> Self {
        Self {
            onboarded: false,
            has_seed_data: false,
            session: None,
            user: None,
            contacts: Vec::new(),
            managed_profiles: Vec::new(),
            demo_enabled: true,
            rotation_days: codeword::DEFAULT_ROTATION_DAYS,
        }
    }
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store honoring the configured demo switch and rotation
    /// period.
    pub fn with_config(config: &Args) -> Self {
        Self {
            demo_enabled: config.demo_mode,
            rotation_days: config.code_rotation_days,
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Session and profile
    // -------------------------------------------------------------------------

    pub fn is_onboarded(&self) -> bool {
        self.onboarded
    }

    pub fn set_onboarded(&mut self, value: bool) {
        self.onboarded = value;
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&IdentityClaim> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// True when the current session cannot perform privileged actions:
    /// no session, an unverified claim, or the demo sentinel subject.
    pub fn is_demo(&self) -> bool {
        match self.session {
            Some(ref claim) => !claim.verified || claim.is_demo(),
            None => true,
        }
    }

    /// Begin a session from a verification result (real or demo).
    ///
    /// Creates the user profile at first verification; a returning subject
    /// keeps the existing profile but has its verified flag refreshed.
    /// Rejected when the demo path is disabled in configuration and the
    /// claim is the demo identity.
    pub fn begin_session(&mut self, claim: IdentityClaim) -> Result<(), StoreError> {
        if claim.is_demo() && !self.demo_enabled {
            return Err(StoreError::DemoDisabled);
        }

        let now = Utc::now();
        match self.user {
            Some(ref mut user) if user.subject == claim.subject => {
                user.verified = claim.verified;
            }
            _ => {
                info!(verified = claim.verified, "creating user profile");
                self.user = Some(UserProfile::from_claim(&claim, now));
            }
        }
        self.session = Some(claim);
        Ok(())
    }

    /// Discard the session claim (held only in memory for its duration).
    pub fn end_session(&mut self) {
        self.session = None;
    }

    pub fn update_profile(
        &mut self,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<(), StoreError> {
        let user = self.user.as_mut().ok_or(StoreError::NoSession)?;
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(phone) = phone {
            user.phone = Some(phone);
        }
        Ok(())
    }

    /// Change the preferred unlock method.
    ///
    /// Selecting PIN without a configured PIN requires one to be supplied
    /// here; it is hashed before it touches the profile.
    pub fn set_unlock_method(
        &mut self,
        method: UnlockMethod,
        new_pin: Option<&str>,
    ) -> Result<(), StoreError> {
        let user = self.user.as_mut().ok_or(StoreError::NoSession)?;

        if let Some(raw) = new_pin {
            user.pin_hash = Some(pin::hash_pin(raw)?);
        }

        if method == UnlockMethod::Pin && user.pin_hash.is_none() {
            return Err(StoreError::PinRequired);
        }

        user.unlock_method = method;
        Ok(())
    }

    /// Check an entered PIN against the configured hash.
    pub fn verify_unlock_pin(&self, entered: &str) -> Result<bool, StoreError> {
        let user = self.user.as_ref().ok_or(StoreError::NoSession)?;
        let hash = user.pin_hash.as_deref().ok_or(StoreError::PinRequired)?;
        pin::verify_pin(entered, hash)
    }

    // -------------------------------------------------------------------------
    // Contacts
    // -------------------------------------------------------------------------

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contact(&self, id: Uuid) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Send a connection request: creates a `pending_sent` contact.
    ///
    /// Privileged: demo identities may explore the app but not create
    /// trust relationships.
    pub fn add_contact(
        &mut self,
        name: impl Into<String>,
        phone: Option<String>,
    ) -> Result<&Contact, StoreError> {
        self.require_verified()?;

        let contact = Contact::new_request(name, phone, Requester::Me, Utc::now());
        debug!(contact = %contact.id, "connection request created");
        self.contacts.push(contact);
        Ok(self.contacts.last().expect("just pushed"))
    }

    /// Synthesize a remote-initiated request as `pending_received`.
    /// Today this is fed by seed/demo data; later by a sync channel.
    pub fn receive_request(
        &mut self,
        name: impl Into<String>,
        phone: Option<String>,
    ) -> &Contact {
        let contact = Contact::new_request(name, phone, Requester::Them, Utc::now());
        self.contacts.push(contact);
        self.contacts.last().expect("just pushed")
    }

    /// Apply a trust-state action to a contact.
    ///
    /// Returns the updated contact, or `None` when the action removed it.
    pub fn apply_to_contact(
        &mut self,
        id: Uuid,
        action: ContactAction,
    ) -> Result<Option<&Contact>, StoreError> {
        Self::apply_in(&mut self.contacts, id, None, &action, self.rotation_days)
    }

    /// Version-checked variant of [`apply_to_contact`]: rejected with
    /// `VersionConflict` when the contact changed since `expected_version`
    /// was read.
    ///
    /// [`apply_to_contact`]: AppStore::apply_to_contact
    pub fn apply_to_contact_versioned(
        &mut self,
        id: Uuid,
        expected_version: u64,
        action: ContactAction,
    ) -> Result<Option<&Contact>, StoreError> {
        Self::apply_in(
            &mut self.contacts,
            id,
            Some(expected_version),
            &action,
            self.rotation_days,
        )
    }

    pub fn accept_contact(&mut self, id: Uuid) -> Result<Option<&Contact>, StoreError> {
        self.apply_to_contact(id, ContactAction::Accept)
    }

    pub fn decline_contact(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.apply_to_contact(id, ContactAction::Decline).map(|_| ())
    }

    pub fn cancel_request(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.apply_to_contact(id, ContactAction::Cancel).map(|_| ())
    }

    pub fn set_code_word(
        &mut self,
        id: Uuid,
        word: impl Into<String>,
    ) -> Result<Option<&Contact>, StoreError> {
        self.apply_to_contact(id, ContactAction::SetCodeWord(word.into()))
    }

    /// Draw a fresh code of the contact's current type.
    pub fn regenerate_code(&mut self, id: Uuid) -> Result<Option<&Contact>, StoreError> {
        self.apply_to_contact(id, ContactAction::RegenerateCode { code_type: None })
    }

    /// Establish a generated code of the given type, switching the contact
    /// over when it differs from the current one.
    pub fn establish_generated_code(
        &mut self,
        id: Uuid,
        code_type: CodeType,
    ) -> Result<Option<&Contact>, StoreError> {
        self.apply_to_contact(
            id,
            ContactAction::RegenerateCode {
                code_type: Some(code_type),
            },
        )
    }

    pub fn check_in(&mut self, id: Uuid) -> Result<Option<&Contact>, StoreError> {
        self.apply_to_contact(id, ContactAction::CheckIn)
    }

    pub fn remove_contact(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.apply_to_contact(id, ContactAction::Remove).map(|_| ())
    }

    // -------------------------------------------------------------------------
    // Managed profiles
    // -------------------------------------------------------------------------

    pub fn managed_profiles(&self) -> &[ManagedProfile] {
        &self.managed_profiles
    }

    pub fn managed_profile(&self, id: Uuid) -> Option<&ManagedProfile> {
        self.managed_profiles.iter().find(|p| p.id == id)
    }

    /// Create a managed profile for a dependent. Privileged: delegated
    /// administration requires a verified administrator.
    pub fn add_managed_profile(
        &mut self,
        name: impl Into<String>,
        relationship: impl Into<String>,
        phone: Option<String>,
    ) -> Result<&ManagedProfile, StoreError> {
        self.require_verified()?;

        let profile = ManagedProfile::new(name, relationship, phone, Utc::now());
        info!(profile = %profile.id, "managed profile created");
        self.managed_profiles.push(profile);
        Ok(self.managed_profiles.last().expect("just pushed"))
    }

    /// Remove a managed profile and its entire contact collection.
    pub fn remove_managed_profile(&mut self, id: Uuid) -> Result<(), StoreError> {
        let before = self.managed_profiles.len();
        self.managed_profiles.retain(|p| p.id != id);
        if self.managed_profiles.len() == before {
            return Err(StoreError::ProfileNotFound);
        }
        Ok(())
    }

    /// Add a contact to a managed profile.
    ///
    /// The administrator performs both sides of the handshake, so the
    /// contact is created directly accepted with a generated code word.
    pub fn add_managed_contact(
        &mut self,
        profile_id: Uuid,
        name: impl Into<String>,
        phone: Option<String>,
        code_type: CodeType,
    ) -> Result<&Contact, StoreError> {
        let now = Utc::now();
        let rotation_days = self.rotation_days;
        let profile = self
            .managed_profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or(StoreError::ProfileNotFound)?;

        let mut contact = Contact::new_request(name, phone, Requester::Me, now);
        contact.status = crate::contacts::ContactStatus::Accepted;
        contact.accepted_at = Some(now);
        contact.code_type = code_type;
        match code_type {
            CodeType::Static => contact.code_word = codeword::generate_static_phrase(),
            CodeType::Rotating => {
                contact.code_word = codeword::generate_rotating_code();
                contact.expires_at = Some(codeword::compute_expiry(rotation_days, now));
            }
        }

        profile.contacts.push(contact);
        Ok(profile.contacts.last().expect("just pushed"))
    }

    /// Apply a trust-state action to a managed profile's contact. Same
    /// state machine, administrator-performed.
    pub fn apply_to_managed_contact(
        &mut self,
        profile_id: Uuid,
        contact_id: Uuid,
        action: ContactAction,
    ) -> Result<Option<&Contact>, StoreError> {
        let rotation_days = self.rotation_days;
        let profile = self
            .managed_profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or(StoreError::ProfileNotFound)?;

        Self::apply_in(&mut profile.contacts, contact_id, None, &action, rotation_days)
    }

    pub fn update_managed_code_word(
        &mut self,
        profile_id: Uuid,
        contact_id: Uuid,
        word: impl Into<String>,
    ) -> Result<Option<&Contact>, StoreError> {
        self.apply_to_managed_contact(profile_id, contact_id, ContactAction::SetCodeWord(word.into()))
    }

    pub fn remove_managed_contact(
        &mut self,
        profile_id: Uuid,
        contact_id: Uuid,
    ) -> Result<(), StoreError> {
        self.apply_to_managed_contact(profile_id, contact_id, ContactAction::Remove)
            .map(|_| ())
    }

    // -------------------------------------------------------------------------
    // Demo data and reset
    // -------------------------------------------------------------------------

    /// Seed the demo dataset once: a few established contacts and one
    /// incoming request, so the app can be explored without a network.
    pub fn seed_demo_data(&mut self) {
        if self.has_seed_data {
            return;
        }
        let now = Utc::now();

        let mut mor = Contact::new_request(
            "Mor (Karen)",
            Some("+45 23 45 67 89".to_string()),
            Requester::Me,
            now - chrono::Duration::days(25),
        );
        mor.status = crate::contacts::ContactStatus::Accepted;
        mor.accepted_at = Some(now - chrono::Duration::days(24));
        mor.code_word = "jordbær-pandekage".to_string();
        mor.last_check_in = Some(now - chrono::Duration::days(10));

        let mut maria = Contact::new_request(
            "Søster (Maria)",
            Some("+45 45 67 89 01".to_string()),
            Requester::Them,
            now - chrono::Duration::days(20),
        );
        maria.status = crate::contacts::ContactStatus::Accepted;
        maria.accepted_at = Some(now - chrono::Duration::days(19));
        maria.code_type = CodeType::Rotating;
        maria.code_word = "HK7N3P".to_string();
        maria.expires_at = Some(now + chrono::Duration::days(10));

        let ole = Contact::new_request(
            "Bedstefar (Ole)",
            Some("+45 56 78 90 12".to_string()),
            Requester::Them,
            now - chrono::Duration::hours(3),
        );

        self.contacts.extend([mor, maria, ole]);
        self.has_seed_data = true;
    }

    pub fn has_seed_data(&self) -> bool {
        self.has_seed_data
    }

    /// Clear all state atomically: session, profile, contacts and managed
    /// profiles. Used for account deletion. Configuration (demo switch,
    /// rotation period) survives the reset.
    pub fn reset(&mut self) {
        info!("resetting application state");
        *self = Self {
            demo_enabled: self.demo_enabled,
            rotation_days: self.rotation_days,
            ..Self::default()
        };
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn require_verified(&self) -> Result<(), StoreError> {
        match self.session {
            None => Err(StoreError::NoSession),
            Some(_) if self.is_demo() => Err(StoreError::VerificationRequired),
            Some(_) => Ok(()),
        }
    }

    fn apply_in<'a>(
        contacts: &'a mut Vec<Contact>,
        id: Uuid,
        expected_version: Option<u64>,
        action: &ContactAction,
        rotation_days: i64,
    ) -> Result<Option<&'a Contact>, StoreError> {
        let index = contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::ContactNotFound)?;

        if let Some(expected) = expected_version {
            let found = contacts[index].version;
            if found != expected {
                return Err(StoreError::VersionConflict { expected, found });
            }
        }

        match apply_transition(&contacts[index], action, Utc::now(), rotation_days)? {
            TransitionOutcome::Updated(next) => {
                contacts[index] = next;
                Ok(Some(&contacts[index]))
            }
            TransitionOutcome::Removed => {
                contacts.remove(index);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::ContactStatus;

    fn verified_store() -> AppStore {
        let mut store = AppStore::new();
        let mut claim = IdentityClaim::demo();
        claim.subject = "mitid-abc".to_string();
        claim.verified = true;
        store.begin_session(claim).unwrap();
        store
    }

    #[test]
    fn test_demo_session_cannot_create_contacts() {
        let mut store = AppStore::new();
        store.begin_session(IdentityClaim::demo()).unwrap();

        assert!(store.is_authenticated());
        assert!(store.is_demo());
        assert!(matches!(
            store.add_contact("Mor (Karen)", None),
            Err(StoreError::VerificationRequired)
        ));
        assert!(store.contacts().is_empty());
    }

    #[test]
    fn test_no_session_cannot_create_contacts() {
        let mut store = AppStore::new();
        assert!(matches!(
            store.add_contact("Mor (Karen)", None),
            Err(StoreError::NoSession)
        ));
    }

    #[test]
    fn test_full_contact_lifecycle() {
        let mut store = verified_store();

        let id = store.receive_request("Far (Henrik)", None).id;
        assert_eq!(
            store.contact(id).unwrap().status,
            ContactStatus::PendingReceived
        );

        let accepted = store.accept_contact(id).unwrap().unwrap();
        assert_eq!(accepted.status, ContactStatus::Accepted);
        assert!(accepted.code_word.is_empty());

        let with_code = store.set_code_word(id, "vikinge-rugbrød").unwrap().unwrap();
        assert_eq!(with_code.code_word, "vikinge-rugbrød");

        store.remove_contact(id).unwrap();
        assert!(store.contact(id).is_none());
    }

    #[test]
    fn test_decline_deletes_without_tombstone() {
        let mut store = verified_store();
        let id = store.receive_request("Ukendt", None).id;

        store.decline_contact(id).unwrap();
        assert!(store.contacts().is_empty());
        assert!(matches!(
            store.decline_contact(id),
            Err(StoreError::ContactNotFound)
        ));
    }

    #[test]
    fn test_rejected_mutation_leaves_state_unchanged() {
        let mut store = verified_store();
        let id = store.receive_request("Mor (Karen)", None).id;
        store.accept_contact(id).unwrap();

        let err = store.set_code_word(id, "ab").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Transition(TransitionError::CodeTooShort)
        ));
        assert_eq!(store.contact(id).unwrap().code_word, "");
    }

    #[test]
    fn test_version_conflict_detected() {
        let mut store = verified_store();
        let id = store.receive_request("Mor (Karen)", None).id;
        let stale = store.contact(id).unwrap().version;

        store.accept_contact(id).unwrap();

        let err = store
            .apply_to_contact_versioned(id, stale, ContactAction::CheckIn)
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
    }

    #[test]
    fn test_pin_unlock_invariant() {
        let mut store = verified_store();

        // Selecting PIN without one configured is rejected
        assert!(matches!(
            store.set_unlock_method(UnlockMethod::Pin, None),
            Err(StoreError::PinRequired)
        ));

        store.set_unlock_method(UnlockMethod::Pin, Some("2580")).unwrap();
        assert_eq!(store.user().unwrap().unlock_method, UnlockMethod::Pin);
        assert!(store.verify_unlock_pin("2580").unwrap());
        assert!(!store.verify_unlock_pin("1111").unwrap());

        // The cleartext PIN is nowhere in the profile
        assert_ne!(store.user().unwrap().pin_hash.as_deref(), Some("2580"));
    }

    #[test]
    fn test_managed_profile_lifecycle() {
        let mut store = verified_store();

        let profile_id = store
            .add_managed_profile("Bedstefar (Ole)", "Bedstefar", None)
            .unwrap()
            .id;

        let contact_id = store
            .add_managed_contact(profile_id, "Mor (Karen)", None, CodeType::Static)
            .unwrap()
            .id;

        // Managed contacts are created directly accepted with a code word
        let contact = &store.managed_profile(profile_id).unwrap().contacts[0];
        assert_eq!(contact.status, ContactStatus::Accepted);
        assert!(contact.code_word.contains('-'));

        store
            .update_managed_code_word(profile_id, contact_id, "koldskål-fyrtårn")
            .unwrap();
        assert_eq!(
            store.managed_profile(profile_id).unwrap().contacts[0].code_word,
            "koldskål-fyrtårn"
        );

        // Managed collections are isolated from the administrator's own
        assert!(store.contacts().is_empty());

        store.remove_managed_contact(profile_id, contact_id).unwrap();
        store.remove_managed_profile(profile_id).unwrap();
        assert!(store.managed_profiles().is_empty());
    }

    #[test]
    fn test_managed_profiles_require_verification() {
        let mut store = AppStore::new();
        store.begin_session(IdentityClaim::demo()).unwrap();
        assert!(matches!(
            store.add_managed_profile("Bedstefar (Ole)", "Bedstefar", None),
            Err(StoreError::VerificationRequired)
        ));
    }

    #[test]
    fn test_returning_subject_keeps_profile() {
        let mut store = verified_store();
        let original_id = store.user().unwrap().id;

        store.end_session();
        assert!(!store.is_authenticated());

        let mut claim = IdentityClaim::demo();
        claim.subject = "mitid-abc".to_string();
        claim.verified = true;
        store.begin_session(claim).unwrap();

        assert_eq!(store.user().unwrap().id, original_id);
    }

    #[test]
    fn test_disabled_demo_mode_rejects_demo_session() {
        let mut config = Args::default();
        config.demo_mode = false;
        let mut store = AppStore::with_config(&config);

        assert!(matches!(
            store.begin_session(IdentityClaim::demo()),
            Err(StoreError::DemoDisabled)
        ));
        assert!(!store.is_authenticated());

        // Verified identities are unaffected by the switch
        let mut claim = IdentityClaim::demo();
        claim.subject = "mitid-abc".to_string();
        claim.verified = true;
        store.begin_session(claim).unwrap();
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_configured_rotation_period_applies_to_regeneration() {
        let mut config = Args::default();
        config.code_rotation_days = 7;
        let mut store = AppStore::with_config(&config);
        let mut claim = IdentityClaim::demo();
        claim.subject = "mitid-abc".to_string();
        claim.verified = true;
        store.begin_session(claim).unwrap();

        let id = store.receive_request("Søster (Maria)", None).id;
        store.accept_contact(id).unwrap();
        store.establish_generated_code(id, CodeType::Rotating).unwrap();

        let expires = store.contact(id).unwrap().expires_at.unwrap();
        assert_eq!(codeword::days_remaining(expires, Utc::now()), 7);

        // Managed contacts draw on the same configured period
        let profile_id = store
            .add_managed_profile("Bedstefar (Ole)", "Bedstefar", None)
            .unwrap()
            .id;
        let managed = store
            .add_managed_contact(profile_id, "Mor (Karen)", None, CodeType::Rotating)
            .unwrap();
        assert_eq!(
            codeword::days_remaining(managed.expires_at.unwrap(), Utc::now()),
            7
        );
    }

    #[test]
    fn test_reset_preserves_configuration() {
        let mut config = Args::default();
        config.demo_mode = false;
        let mut store = AppStore::with_config(&config);

        store.reset();

        assert!(matches!(
            store.begin_session(IdentityClaim::demo()),
            Err(StoreError::DemoDisabled)
        ));
    }

    #[test]
    fn test_seed_demo_data_is_idempotent() {
        let mut store = AppStore::new();
        store.seed_demo_data();
        let count = store.contacts().len();
        assert!(count > 0);
        assert!(store
            .contacts()
            .iter()
            .any(|c| c.status == ContactStatus::PendingReceived));

        store.seed_demo_data();
        assert_eq!(store.contacts().len(), count);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = verified_store();
        store.set_onboarded(true);
        store.receive_request("Mor (Karen)", None);
        store.add_managed_profile("Bedstefar (Ole)", "Bedstefar", None).unwrap();
        store.seed_demo_data();

        store.reset();

        assert!(!store.is_onboarded());
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(store.contacts().is_empty());
        assert!(store.managed_profiles().is_empty());
        assert!(!store.has_seed_data());
    }
}
