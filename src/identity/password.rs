use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use tracing::warn;

use crate::error::{AuthError, AuthResult};

const SALT_LEN: usize = 16;

fn fresh_salt() -> AuthResult<SaltString> {
    let mut raw = [0u8; SALT_LEN];
    getrandom::getrandom(&mut raw).map_err(|e| AuthError::storage(format!("salt generation failed: {}", e)))?;
    SaltString::encode_b64(&raw).map_err(|e| AuthError::storage(format!("salt encoding failed: {}", e)))
}

/// Argon2 PHC string for a newly registered password.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = fresh_salt()?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| AuthError::storage(format!("password hashing failed: {}", e)))
}

/// Check `password` against a stored PHC string. A roster entry whose hash cannot be
/// parsed never matches; that is logged since it means the entry itself is damaged.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(p) => p,
        Err(e) => {
            warn!(target: "adminauth::auth", "stored password hash is unreadable: {}", e);
            return false;
        }
    };
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => true,
        Err(password_hash::Error::Password) => false,
        Err(e) => {
            warn!(target: "adminauth::auth", "password verification failed: {}", e);
            false
        }
    }
}
