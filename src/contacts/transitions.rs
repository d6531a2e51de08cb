//! Contact trust state machine
//!
//! One pure transition function over a contact's status and code-word
//! fields, callable independent of any storage or UI. The store invokes
//! only this function for contact mutations.
//!
//! ## Legal transitions
//!
//! | From             | Action        | To       |
//! |------------------|---------------|----------|
//! | pending_sent     | accept (mirror flows, requested_by=them) | accepted |
//! | pending_received | accept        | accepted |
//! | pending_received | decline       | removed  |
//! | pending_sent     | cancel        | removed  |
//! | accepted         | set code word | accepted |
//! | accepted         | regenerate    | accepted |
//! | accepted         | check-in      | accepted |
//! | accepted         | remove        | removed  |
//!
//! Any other (state, action) pair is rejected without mutating the contact.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::codeword;

use super::{CodeType, Contact, ContactStatus, Requester};

/// Minimum trimmed length for a manually chosen code word
pub const MIN_CODE_WORD_CHARS: usize = 3;

/// An operation on a contact's trust state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactAction {
    /// Accept a pending request (non-initiator only)
    Accept,
    /// Decline a received request; the contact is deleted
    Decline,
    /// Withdraw a sent request; the contact is deleted
    Cancel,
    /// Manually set the code word (also establishes the first one)
    SetCodeWord(String),
    /// Replace the code word via the generator, optionally switching the
    /// code type; rotating codes get a fresh expiry
    RegenerateCode { code_type: Option<CodeType> },
    /// Record that a reminder was sent
    CheckIn,
    /// Remove an accepted contact; irreversible
    Remove,
}

/// Rejection reasons. Signalled as rejected operations, not panics, so the
/// caller can re-render the same form with an inline message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Action not allowed in status {status:?}")]
    IllegalTransition { status: ContactStatus },

    #[error("Only the requested party may accept a sent request")]
    NotTheRecipient,

    #[error("Code word must be at least {MIN_CODE_WORD_CHARS} characters")]
    CodeTooShort,
}

/// Result of a legal transition
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// The contact continues to exist with updated fields
    Updated(Contact),
    /// The contact is deleted; no tombstone is retained
    Removed,
}

/// Apply `action` to `contact` at `now`. `rotation_days` is the configured
/// validity window drawn on when a rotating code is (re)generated.
///
/// Pure: the input contact is untouched; a successful non-removal returns
/// the updated copy with its version bumped. Rejections leave no trace.
pub fn apply_transition(
    contact: &Contact,
    action: &ContactAction,
    now: DateTime<Utc>,
    rotation_days: i64,
) -> Result<TransitionOutcome, TransitionError> {
    match (contact.status, action) {
        (ContactStatus::PendingReceived, ContactAction::Accept) => {
            Ok(updated(contact, |c| {
                c.status = ContactStatus::Accepted;
                c.accepted_at = Some(now);
            }))
        }

        // Mirror flow: both sides created the request locally; the sent
        // copy may still be accepted when the other party initiated
        (ContactStatus::PendingSent, ContactAction::Accept) => {
            if contact.requested_by != Requester::Them {
                return Err(TransitionError::NotTheRecipient);
            }
            Ok(updated(contact, |c| {
                c.status = ContactStatus::Accepted;
                c.accepted_at = Some(now);
            }))
        }

        (ContactStatus::PendingReceived, ContactAction::Decline) => {
            debug!(contact = %contact.id, "request declined, removing");
            Ok(TransitionOutcome::Removed)
        }

        (ContactStatus::PendingSent, ContactAction::Cancel) => {
            debug!(contact = %contact.id, "request cancelled, removing");
            Ok(TransitionOutcome::Removed)
        }

        (ContactStatus::Accepted, ContactAction::SetCodeWord(word)) => {
            let trimmed = word.trim();
            if trimmed.chars().count() < MIN_CODE_WORD_CHARS {
                return Err(TransitionError::CodeTooShort);
            }
            let trimmed = trimmed.to_string();
            Ok(updated(contact, |c| c.code_word = trimmed))
        }

        (ContactStatus::Accepted, ContactAction::RegenerateCode { code_type }) => {
            let code_type = code_type.unwrap_or(contact.code_type);
            Ok(updated(contact, |c| {
                c.code_type = code_type;
                match code_type {
                    CodeType::Static => {
                        c.code_word = codeword::generate_static_phrase();
                        c.expires_at = None;
                    }
                    CodeType::Rotating => {
                        c.code_word = codeword::generate_rotating_code();
                        c.expires_at = Some(codeword::compute_expiry(rotation_days, now));
                    }
                }
            }))
        }

        (ContactStatus::Accepted, ContactAction::CheckIn) => {
            Ok(updated(contact, |c| c.last_check_in = Some(now)))
        }

        (ContactStatus::Accepted, ContactAction::Remove) => {
            debug!(contact = %contact.id, "contact removed");
            Ok(TransitionOutcome::Removed)
        }

        _ => Err(TransitionError::IllegalTransition {
            status: contact.status,
        }),
    }
}

fn updated(contact: &Contact, mutate: impl FnOnce(&mut Contact)) -> TransitionOutcome {
    let mut next = contact.clone();
    mutate(&mut next);
    next.version += 1;
    TransitionOutcome::Updated(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn apply(
        contact: &Contact,
        action: &ContactAction,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TransitionError> {
        apply_transition(contact, action, now, codeword::DEFAULT_ROTATION_DAYS)
    }

    fn pending_received() -> Contact {
        Contact::new_request("Mor (Karen)", None, Requester::Them, Utc::now())
    }

    fn pending_sent() -> Contact {
        Contact::new_request("Far (Henrik)", None, Requester::Me, Utc::now())
    }

    fn accepted() -> Contact {
        let now = Utc::now();
        match apply(&pending_received(), &ContactAction::Accept, now).unwrap() {
            TransitionOutcome::Updated(c) => c,
            TransitionOutcome::Removed => unreachable!(),
        }
    }

    fn expect_updated(outcome: TransitionOutcome) -> Contact {
        match outcome {
            TransitionOutcome::Updated(c) => c,
            TransitionOutcome::Removed => panic!("expected updated contact"),
        }
    }

    #[test]
    fn test_accept_received_request() {
        let now = Utc::now();
        let contact = expect_updated(
            apply(&pending_received(), &ContactAction::Accept, now).unwrap(),
        );
        assert_eq!(contact.status, ContactStatus::Accepted);
        assert_eq!(contact.accepted_at, Some(now));
        assert!(contact.code_word.is_empty());
        assert_eq!(contact.version, 1);
    }

    #[test]
    fn test_accept_sent_request_requires_mirror_flow() {
        // We initiated: nothing to accept on our side
        let err =
            apply(&pending_sent(), &ContactAction::Accept, Utc::now()).unwrap_err();
        assert_eq!(err, TransitionError::NotTheRecipient);

        // Mirror flow: sent copy of a request they initiated
        let mut mirrored = pending_sent();
        mirrored.requested_by = Requester::Them;
        let contact = expect_updated(
            apply(&mirrored, &ContactAction::Accept, Utc::now()).unwrap(),
        );
        assert_eq!(contact.status, ContactStatus::Accepted);
    }

    #[test]
    fn test_decline_and_cancel_remove() {
        assert!(matches!(
            apply(&pending_received(), &ContactAction::Decline, Utc::now()),
            Ok(TransitionOutcome::Removed)
        ));
        assert!(matches!(
            apply(&pending_sent(), &ContactAction::Cancel, Utc::now()),
            Ok(TransitionOutcome::Removed)
        ));
    }

    #[test]
    fn test_set_code_word_trims_and_validates() {
        let contact = accepted();

        let updated = expect_updated(
            apply(
                &contact,
                &ContactAction::SetCodeWord("  jordbær-is  ".to_string()),
                Utc::now(),
            )
            .unwrap(),
        );
        assert_eq!(updated.code_word, "jordbær-is");

        // Two characters after trimming: rejected, input untouched
        let err = apply(
            &contact,
            &ContactAction::SetCodeWord(" ab ".to_string()),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::CodeTooShort);
        assert!(contact.code_word.is_empty());
    }

    #[test]
    fn test_min_length_counts_chars_not_bytes() {
        // "øre" is 3 chars but 4 bytes; must pass
        let contact = accepted();
        let updated = expect_updated(
            apply(
                &contact,
                &ContactAction::SetCodeWord("øre".to_string()),
                Utc::now(),
            )
            .unwrap(),
        );
        assert_eq!(updated.code_word, "øre");
    }

    #[test]
    fn test_regenerate_static_draws_from_generator() {
        let mut contact = accepted();
        contact.code_word = "gammel-kode".to_string();

        let updated = expect_updated(
            apply(
                &contact,
                &ContactAction::RegenerateCode { code_type: None },
                Utc::now(),
            )
            .unwrap(),
        );
        assert!(!updated.code_word.is_empty());
        assert!(updated.code_word.contains('-'));
        assert!(updated.expires_at.is_none());
    }

    #[test]
    fn test_regenerate_can_switch_code_type() {
        let now = Utc::now();
        let contact = accepted();

        let rotating = expect_updated(
            apply(
                &contact,
                &ContactAction::RegenerateCode {
                    code_type: Some(CodeType::Rotating),
                },
                now,
            )
            .unwrap(),
        );
        assert_eq!(rotating.code_type, CodeType::Rotating);
        assert!(rotating.expires_at.is_some());

        // Switching back to static clears the expiry
        let back = expect_updated(
            apply(
                &rotating,
                &ContactAction::RegenerateCode {
                    code_type: Some(CodeType::Static),
                },
                now,
            )
            .unwrap(),
        );
        assert_eq!(back.code_type, CodeType::Static);
        assert!(back.expires_at.is_none());
    }

    #[test]
    fn test_regenerate_rotating_resets_expiry() {
        let now = Utc::now();
        let mut contact = accepted();
        contact.code_type = CodeType::Rotating;
        contact.code_word = "HK7N3P".to_string();
        contact.expires_at = Some(now + Duration::days(5));

        let updated = expect_updated(
            apply(&contact, &ContactAction::RegenerateCode { code_type: None }, now)
                .unwrap(),
        );
        assert_eq!(updated.code_word.len(), 6);
        let expires = updated.expires_at.expect("rotating code keeps an expiry");
        assert_eq!(crate::codeword::days_remaining(expires, now), 30);
    }

    #[test]
    fn test_regenerate_honors_configured_rotation_period() {
        let now = Utc::now();
        let mut contact = accepted();
        contact.code_type = CodeType::Rotating;

        let updated = expect_updated(
            apply_transition(
                &contact,
                &ContactAction::RegenerateCode { code_type: None },
                now,
                7,
            )
            .unwrap(),
        );
        assert_eq!(
            crate::codeword::days_remaining(updated.expires_at.unwrap(), now),
            7
        );
    }

    #[test]
    fn test_check_in_is_idempotent_beyond_timestamp() {
        let contact = accepted();
        let t1 = Utc::now();
        let t2 = t1 + Duration::minutes(5);

        let first =
            expect_updated(apply(&contact, &ContactAction::CheckIn, t1).unwrap());
        let second =
            expect_updated(apply(&first, &ContactAction::CheckIn, t2).unwrap());

        assert_eq!(second.last_check_in, Some(t2));
        assert_eq!(second.status, contact.status);
        assert_eq!(second.code_word, contact.code_word);
        assert_eq!(second.accepted_at, first.accepted_at);
    }

    #[test]
    fn test_first_code_word_on_empty_accepted_contact() {
        let contact = accepted();
        assert!(contact.awaiting_first_code());

        let updated = expect_updated(
            apply(
                &contact,
                &ContactAction::SetCodeWord("koldskål".to_string()),
                Utc::now(),
            )
            .unwrap(),
        );
        assert!(!updated.awaiting_first_code());
    }

    #[test]
    fn test_illegal_pairs_are_rejected_without_mutation() {
        let now = Utc::now();
        let cases: Vec<(Contact, ContactAction)> = vec![
            (pending_sent(), ContactAction::Decline),
            (pending_sent(), ContactAction::SetCodeWord("abc".into())),
            (pending_sent(), ContactAction::RegenerateCode { code_type: None }),
            (pending_sent(), ContactAction::CheckIn),
            (pending_sent(), ContactAction::Remove),
            (pending_received(), ContactAction::Cancel),
            (pending_received(), ContactAction::SetCodeWord("abc".into())),
            (pending_received(), ContactAction::RegenerateCode { code_type: None }),
            (pending_received(), ContactAction::CheckIn),
            (pending_received(), ContactAction::Remove),
            (accepted(), ContactAction::Accept),
            (accepted(), ContactAction::Decline),
            (accepted(), ContactAction::Cancel),
        ];

        for (contact, action) in cases {
            let err = apply(&contact, &action, now).unwrap_err();
            assert!(
                matches!(
                    err,
                    TransitionError::IllegalTransition { .. } | TransitionError::NotTheRecipient
                ),
                "({:?}, {:?}) must be rejected",
                contact.status,
                action
            );
        }
    }

    #[test]
    fn test_pending_contacts_never_carry_a_code_word() {
        // Walk a full valid sequence and check the invariant at each step
        let now = Utc::now();
        let contact = pending_received();
        assert!(contact.code_word.is_empty());

        let accepted = expect_updated(
            apply(&contact, &ContactAction::Accept, now).unwrap(),
        );
        assert!(accepted.code_word.is_empty());

        let with_code = expect_updated(
            apply(
                &accepted,
                &ContactAction::SetCodeWord("fælles-kode".to_string()),
                now,
            )
            .unwrap(),
        );
        assert!(!with_code.is_pending());
    }
}
