use sha2::{Digest, Sha256};

/// Hash a plaintext password to its hex-encoded SHA-256 digest.
///
/// Deterministic and unsalted so that login can match on stored hash
/// equality. Demonstration-grade only: swap in a salted, slow hash
/// (argon2) before trusting this service with real credentials.
pub fn hash_password(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}
