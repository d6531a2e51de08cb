//! Code word sealing for relay sync.
//!
//! Code words are the secret the whole product protects, so they never
//! cross the relay boundary in cleartext. Before a contact record is
//! synced, its code word is sealed with ChaCha20-Poly1305 under a key
//! derived from the user's device passphrase with Argon2id.
//!
//! Argon2id parameters are tuned for passphrase-based key derivation:
//! 64 MB memory, 3 iterations, 4 parallelism threads.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::RelayError;

/// Argon2id memory cost in KiB (64 MB)
const ARGON2_MEMORY_KB: u32 = 65536;

/// Argon2id iteration count
const ARGON2_ITERATIONS: u32 = 3;

/// Argon2id parallelism (threads)
const ARGON2_PARALLELISM: u32 = 4;

/// Salt length for key derivation (16 bytes)
pub const SALT_LEN: usize = 16;

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
const NONCE_LEN: usize = 12;

/// A derived sealing key. Wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SealingKey([u8; 32]);

/// Generate a random salt for key derivation (unique per user).
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a sealing key from a passphrase using Argon2id.
pub fn derive_sealing_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
) -> Result<SealingKey, RelayError> {
    let params = Params::new(
        ARGON2_MEMORY_KB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(32),
    )
    .map_err(|e| RelayError::Crypto(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|e| RelayError::Crypto(format!("Key derivation failed: {e}")))?;

    Ok(SealingKey(key))
}

/// Seal a code word for transport: random 12-byte nonce, ChaCha20-Poly1305,
/// nonce prepended to the ciphertext, base64-encoded.
pub fn seal_code_word(key: &SealingKey, code_word: &str) -> Result<String, RelayError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), code_word.as_bytes())
        .map_err(|e| RelayError::Crypto(format!("Sealing failed: {e}")))?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(envelope))
}

/// Open a sealed code word. Fails when the key is wrong or the envelope
/// was tampered with (auth tag verification).
pub fn open_code_word(key: &SealingKey, sealed: &str) -> Result<String, RelayError> {
    let envelope = STANDARD
        .decode(sealed)
        .map_err(|e| RelayError::Crypto(format!("Invalid sealed envelope: {e}")))?;

    if envelope.len() < NONCE_LEN {
        return Err(RelayError::Crypto("Sealed envelope too short".to_string()));
    }
    let (nonce, ciphertext) = envelope.split_at(NONCE_LEN);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| RelayError::Crypto("Failed to open sealed code word".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| RelayError::Crypto(format!("Sealed payload not UTF-8: {e}")))
}
