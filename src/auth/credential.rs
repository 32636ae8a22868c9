use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashingFailure(String);

/// Password material for a user. Plaintext only ever passes through as a
/// function argument; the only state carried here is the salted hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// No hash computed yet; verification always fails.
    Unset,
    /// PHC-format argon2 hash string.
    Set(String),
}

impl Credential {
    /// Hash a plaintext password with a fresh random salt. Cost parameters
    /// are argon2's defaults, fixed here rather than caller-supplied.
    pub fn set(plaintext: &str) -> Result<Self, HashingFailure> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                HashingFailure(e.to_string())
            })?
            .to_string();
        Ok(Credential::Set(hash))
    }

    /// Rehydrate from a hash loaded out of storage.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Credential::Set(hash.into())
    }

    /// Compare a candidate password against the stored hash. `Unset`
    /// credentials and unparsable stored hashes verify false rather than
    /// erroring, so callers see a single rejection path regardless of why
    /// the credential is unusable. The comparison itself is argon2's
    /// constant-time routine.
    pub fn verify(&self, candidate: &str) -> bool {
        let Credential::Set(hash) = self else {
            return false;
        };
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "argon2 parse hash error");
                return false;
            }
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// The persistable form. `None` for `Unset` — an unset credential has
    /// nothing that may legally reach storage.
    pub fn hash(&self) -> Option<&str> {
        match self {
            Credential::Set(hash) => Some(hash),
            Credential::Unset => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_verify_roundtrip() {
        let cred = Credential::set("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(cred.verify("Secur3P@ssw0rd!"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let cred = Credential::set("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!cred.verify("correct-horse-battery-staplex"));
    }

    #[test]
    fn unset_never_verifies() {
        assert!(!Credential::Unset.verify("anything"));
        assert!(!Credential::Unset.verify(""));
    }

    #[test]
    fn hash_is_not_the_plaintext() {
        let cred = Credential::set("secret1").expect("hashing should succeed");
        let hash = cred.hash().expect("set credential has a hash");
        assert_ne!(hash, "secret1");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn same_plaintext_hashes_differently() {
        let a = Credential::set("secret1").expect("hashing should succeed");
        let b = Credential::set("secret1").expect("hashing should succeed");
        assert_ne!(a.hash(), b.hash());
        assert!(a.verify("secret1"));
        assert!(b.verify("secret1"));
    }

    #[test]
    fn malformed_stored_hash_verifies_false() {
        let cred = Credential::from_hash("not-a-valid-hash");
        assert!(!cred.verify("anything"));
    }

    #[test]
    fn unset_has_no_persistable_hash() {
        assert!(Credential::Unset.hash().is_none());
    }
}
