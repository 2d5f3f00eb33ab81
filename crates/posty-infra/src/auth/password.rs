//! Argon2 password hashing for site accounts.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use posty_core::ports::{AuthError, PasswordService};

/// Argon2id password service with a fresh random salt per hash.
pub struct Argon2PasswordService {
    hasher: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AuthError::MalformedHash(e.to_string()))?;

        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
