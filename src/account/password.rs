/// Password hashing and verification using Argon2id
///
/// Hashes are PHC strings carrying their own salt and parameters.
use crate::error::{LuneError, LuneResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a secret with a fresh random salt
pub fn hash_password(password: &str) -> LuneResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LuneError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a secret against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> LuneResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| LuneError::Internal(format!("Invalid password hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
