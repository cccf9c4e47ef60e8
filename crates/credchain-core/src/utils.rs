//! Utils module.
use serde::Serialize;
use sha2::{Digest, Sha256};

/// JSON Canonicalization Scheme (RFC 8785) serialization.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_jcs::to_string(value)
}

/// SHA-256 digest of the given bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
