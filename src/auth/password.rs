//! Password hashing with Argon2.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use super::AuthError;

/// A well-formed Argon2id hash with default parameters that no password is known to
/// match. Login verifies against it when the email is unknown, so both rejections
/// cost one full Argon2 run.
pub const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$uU5qQgpzYrI2vGXZwYepRQ$lQPcESkggUp3lQrpWaGKUXHZD+48/oZuI+TaHkb3VBw";

/// Hashing seam used by the login and register handlers and the `create_admin` binary.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Constant-time comparison. An unparsable stored hash never verifies.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
