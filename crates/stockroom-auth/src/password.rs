//! Password Service
//!
//! Argon2id hashing (OWASP recommended) with configurable cost parameters.
//! Hashes are stored in PHC string format, so verification reads the
//! parameters back from the hash itself.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::config::PasswordConfig;
use crate::error::{AuthError, AuthResult};

/// Password service for hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    /// Create a new password service
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.validate_password(password)?;

        let password = Zeroizing::new(password.as_bytes().to_vec());
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.hash_length as usize),
        )
        .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(&password, &salt)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// `Ok(false)` means the password is wrong; `Err` means the stored hash
    /// could not be used at all.
    pub fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Unreadable password hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!("Password verification failed: {}", e))),
        }
    }

    /// Length rules for a new password
    pub fn validate_password(&self, password: &str) -> AuthResult<()> {
        let len = password.chars().count();

        if len < self.config.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if len > self.config.max_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at most {} characters",
                self.config.max_password_length
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PasswordConfig {
        PasswordConfig {
            // Use lower values for tests to be fast
            memory_cost: 4096,
            time_cost: 1,
            ..PasswordConfig::default()
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let service = PasswordService::new(test_config());
        let password = "correct horse battery";

        let hash = service.hash_password(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(service.verify_password(password, &hash).unwrap());
        assert!(!service.verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn test_password_length_rules() {
        let service = PasswordService::new(test_config());

        assert!(service.validate_password("12345678").is_ok());
        assert!(matches!(
            service.validate_password("1234567"),
            Err(AuthError::Validation(_))
        ));
        assert!(service.validate_password(&"x".repeat(129)).is_err());
        // Counted in characters, not bytes
        assert!(service.validate_password("ééééééé").is_err());
    }

    #[test]
    fn test_short_password_not_hashed() {
        let service = PasswordService::new(test_config());
        assert!(matches!(
            service.hash_password("short"),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        let service = PasswordService::new(test_config());
        assert!(service.verify_password("whatever1", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_different_passwords_different_hashes() {
        let service = PasswordService::new(test_config());
        let password = "correct horse battery";

        let hash1 = service.hash_password(password).unwrap();
        let hash2 = service.hash_password(password).unwrap();

        // Same password should produce different hashes (different salts)
        assert_ne!(hash1, hash2);
        assert!(service.verify_password(password, &hash1).unwrap());
        assert!(service.verify_password(password, &hash2).unwrap());
    }
}
