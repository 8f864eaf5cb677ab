//! One-way password hashing.
//!
//! Every password written to the store goes through a [`PasswordHasher`].
//! The production implementation is [`BcryptHasher`]; bcrypt salts each
//! hash, so hashing the same plaintext twice yields different strings.

use tracing::debug;

use crate::Result;

/// One-way password hashing used by the account writer.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into an opaque string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying hash function fails.
    fn hash(&self, plaintext: &str) -> Result<String>;
}

/// Bcrypt password hasher.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Creates a hasher with the given work factor.
    ///
    /// Costs outside bcrypt's accepted range are rejected at hash time.
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// The configured work factor.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let hashed = bcrypt::hash(plaintext, self.cost)?;
        debug!("Hashed password with bcrypt cost {}", self.cost);
        Ok(hashed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_not_plaintext_and_verifies() {
        let hasher = BcryptHasher::new(4);
        let hashed = hasher.hash("pw1").unwrap();

        assert_ne!(hashed, "pw1");
        assert!(bcrypt::verify("pw1", &hashed).unwrap());
        assert!(!bcrypt::verify("pw2", &hashed).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = BcryptHasher::new(4);
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        let hasher = BcryptHasher::new(1);
        assert!(hasher.hash("pw").is_err());
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(BcryptHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}
