// src/utils/password.rs
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use rand::RngCore;

use crate::errors::TaxiResult;

/// Password hasher seam, so stored hashes stay self-describing PHC strings
/// whatever the algorithm.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> TaxiResult<String>;
    fn verify(&self, password: &str, hash: &str) -> TaxiResult<bool>;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> TaxiResult<String> {
        let mut salt_bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)?;

        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> TaxiResult<bool> {
        let parsed = PasswordHash::new(hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
