//! Password hashing and session tokens.
//!
//! Passwords are stored as Argon2id hashes; the plaintext only exists in the
//! decoded login/register parameters. Session tokens are opaque UUIDs issued
//! on first successful login and stable for the account's lifetime.

use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use uuid::Uuid;

use crate::world::errors::WorldError;

/// Minimum accepted password length for new registrations.
pub const MIN_PASSWORD_LEN: usize = 2;

pub fn hash_password(password: &str) -> Result<String, WorldError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| WorldError::auth(format!("password hash failure: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> Result<bool, WorldError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| WorldError::auth(format!("corrupt password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("pw").expect("hash");
        assert!(verify_password("pw", &hash).expect("verify"));
        assert!(!verify_password("wrong", &hash).expect("verify"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("pw").expect("hash");
        let b = hash_password("pw").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(new_session_token(), new_session_token());
    }
}
