//! Short digests that keep generated names of factory overloads apart.

use mapforge_core::lang::conventions::DIGEST_LEN;
use sha2::{Digest, Sha256};

/// First [`DIGEST_LEN`] lowercase hex characters of the SHA-256 of `declaration`.
pub fn digest(declaration: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(declaration.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(DIGEST_LEN);
    hex
}
