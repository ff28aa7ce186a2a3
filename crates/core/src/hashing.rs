//! SHA-256 digests for privacy-safe logging.
//!
//! Client addresses and session ids are logged only through
//! [`hash_sensitive_data`].

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest when hashing log fields.
pub const LOG_HASH_LENGTH: usize = 16;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Short, stable, non-reversible fingerprint of a sensitive value.
pub fn hash_sensitive_data(data: &str) -> String {
    let mut hex = sha256_hex(data.as_bytes());
    hex.truncate(LOG_HASH_LENGTH);
    hex
}
