//! Code-word generation
//!
//! Produces the shared secrets two parties use to verify each other over a
//! voice channel: memorable static pass-phrases and short rotating codes.
//!
//! Static phrases are picked from a fixed Danish vocabulary and joined with
//! a hyphen. They are designed for human memorability over a phone call,
//! not for entropy - a deliberate trade-off: the threat model is a scammer
//! who does not know the phrase at all, not one brute-forcing it.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

/// Default rotation period for rotating codes, in days
pub const DEFAULT_ROTATION_DAYS: i64 = 30;

/// Rotating-code length
pub const ROTATING_CODE_LEN: usize = 6;

/// Unambiguous alphabet for rotating codes: uppercase letters and digits,
/// excluding the visually confusable 0/O and 1/I
pub const ROTATING_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Vocabulary for static pass-phrases
const STATIC_WORDS: &[&str] = &[
    "jordbær", "solskin", "sommerfugl", "regnbue", "havfrue",
    "vikinge", "pandekage", "kanelsnegl", "fyrtårn", "cykelsmed",
    "skovtur", "klaphat", "rugbrød", "strandsand", "blåbær",
    "vindmølle", "smørblomst", "danskvand", "hyggebukser", "koldskål",
    "wienerbrød", "flødebolle", "kagemand", "legehus", "fiskesø",
    "sølvmåge", "bøgeskov", "mælkebøtte", "hindbær", "strandvejr",
    "morgenmad", "flagstang", "grøntsag", "havregris", "æblekage",
    "kartoffel", "ringridning", "pølsevogn", "loppemarked", "fællessang",
];

/// Generate a static pass-phrase: two words picked independently and
/// uniformly at random (with replacement, so they may coincide), joined by
/// a hyphen. E.g. `"jordbær-pandekage"`.
pub fn generate_static_phrase() -> String {
    let mut rng = rand::thread_rng();
    let first = STATIC_WORDS.choose(&mut rng).unwrap_or(&STATIC_WORDS[0]);
    let second = STATIC_WORDS.choose(&mut rng).unwrap_or(&STATIC_WORDS[0]);
    format!("{first}-{second}")
}

/// Generate a 6-character rotating code from the unambiguous alphabet.
pub fn generate_rotating_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROTATING_CODE_LEN)
        .map(|_| ROTATING_ALPHABET[rng.gen_range(0..ROTATING_ALPHABET.len())] as char)
        .collect()
}

/// Expiry timestamp `days` from `now`.
pub fn compute_expiry(days: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(days)
}

/// Whole days remaining until `expiry`, as a ceiling, floored at 0.
pub fn days_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (expiry - now).num_milliseconds();
    if remaining_ms <= 0 {
        return 0;
    }
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    // Ceiling division; remaining_ms is positive past the guard
    (remaining_ms + DAY_MS - 1) / DAY_MS
}
