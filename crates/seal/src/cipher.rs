//! Keystream sealing with authentication.

use sha2::{Digest, Sha256};

use veil_types::SealedCiphertext;

use crate::error::SealError;

const KEYSTREAM_DOMAIN: &[u8] = b"VEIL_SEAL_KSTREAM_V1:";
const TAG_DOMAIN: &[u8] = b"VEIL_SEAL_TAG_V1:";

/// Seal key held by the evaluation engine and the decryption gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct SealKey([u8; 32]);

impl SealKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// Key material stays out of debug output.
impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealKey(..)")
    }
}

/// Derive `len` keystream bytes from key and nonce, SHA-256 in counter mode.
fn keystream(key: &SealKey, nonce: &[u8; 16], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut counter = 0u64;
    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(KEYSTREAM_DOMAIN);
        hasher.update(key.0);
        hasher.update(nonce);
        hasher.update(counter.to_le_bytes());
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(len);
    out
}

/// Authentication tag over key, nonce, and masked body.
fn auth_tag(key: &SealKey, nonce: &[u8; 16], body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(TAG_DOMAIN);
    hasher.update(key.0);
    hasher.update(nonce);
    hasher.update(body);
    hasher.finalize().into()
}

/// Seal a plaintext encoding under the given key and nonce.
pub fn seal(key: &SealKey, nonce: [u8; 16], plaintext: &[u8]) -> SealedCiphertext {
    let stream = keystream(key, &nonce, plaintext.len());
    let body: Vec<u8> = plaintext
        .iter()
        .zip(stream.iter())
        .map(|(p, k)| p ^ k)
        .collect();
    let tag = auth_tag(key, &nonce, &body);

    SealedCiphertext { body, nonce, tag }
}

/// Unseal a ciphertext, verifying its authentication tag first.
pub fn unseal(key: &SealKey, ciphertext: &SealedCiphertext) -> Result<Vec<u8>, SealError> {
    let expected = auth_tag(key, &ciphertext.nonce, &ciphertext.body);
    if expected != ciphertext.tag {
        return Err(SealError::AuthenticationFailed);
    }

    let stream = keystream(key, &ciphertext.nonce, ciphertext.body.len());
    Ok(ciphertext
        .body
        .iter()
        .zip(stream.iter())
        .map(|(b, k)| b ^ k)
        .collect())
}
