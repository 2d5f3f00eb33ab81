//! Password hashing port for site accounts.

/// Hashes and checks account passwords. Synchronous: hashing is CPU work
/// with no I/O.
pub trait PasswordService: Send + Sync {
    /// Hash `password` into a self-describing string (salt included).
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` for a wrong password, `Err` only when `hash` is unusable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}
