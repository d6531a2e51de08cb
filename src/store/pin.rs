//! PIN hashing and verification using Argon2
//!
//! The unlock PIN never lives in the store as cleartext; only its
//! PHC-formatted argon2id hash does.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::StoreError;

/// Hash a PIN using Argon2id.
///
/// Returns the PHC-formatted hash string that includes the salt and
/// parameters.
pub fn hash_pin(pin: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Pin(format!("Failed to hash PIN: {e}")))
}

/// Verify a PIN against a stored hash.
pub fn verify_pin(pin: &str, hash: &str) -> Result<bool, StoreError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| StoreError::Pin(format!("Invalid PIN hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(pin.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_pin("2580").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_pin("2580", &hash).unwrap());
        assert!(!verify_pin("0852", &hash).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_pin("2580", "not-a-valid-hash").is_err());
    }
}
