//! Content hashing for templates and dossier identities.
//!
//! Templates are fingerprinted so that a suspended session can detect that
//! the catalog changed underneath it. The hash covers the serialized form,
//! so any change to prompts, options, or follow-up wiring changes it.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute the SHA-256 content hash of any serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> Result<ContentHash, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(digest(&json))
}

/// SHA-256 of raw bytes.
pub fn digest(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &[u8]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
