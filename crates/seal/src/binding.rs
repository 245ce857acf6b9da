//! Caller-binding proofs for imported ciphertexts.
//!
//! A binding proof certifies that a ciphertext was produced by (or for) the
//! submitting principal. Importing a ciphertext under a different principal,
//! or with a proof copied from another submission, fails verification.

use sha2::{Digest, Sha256};

use veil_types::{ImportProof, Principal, SealedCiphertext};

const BINDING_DOMAIN: &[u8] = b"VEIL_SEAL_BIND_V1:";

fn binding_digest(principal: &Principal, ciphertext: &SealedCiphertext) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(BINDING_DOMAIN);
    hasher.update(principal);
    hasher.update(ciphertext.nonce);
    hasher.update(&ciphertext.body);
    hasher.update(ciphertext.tag);
    hasher.finalize().into()
}

/// Produce the binding proof for a ciphertext submitted by `principal`.
pub fn prove_binding(principal: &Principal, ciphertext: &SealedCiphertext) -> ImportProof {
    ImportProof {
        binding: binding_digest(principal, ciphertext),
    }
}

/// Verify that `proof` binds `ciphertext` to `principal`.
pub fn verify_binding(
    principal: &Principal,
    ciphertext: &SealedCiphertext,
    proof: &ImportProof,
) -> bool {
    binding_digest(principal, ciphertext) == proof.binding
}
