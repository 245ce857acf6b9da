//! Sealing primitive for opaque auction values.
//!
//! This crate is the trusted boundary bid ciphertexts cross on import.
//! It provides:
//!
//! 1. **Sealing**: masking a plaintext encoding under a keystream derived
//!    from the engine's seal key, with an authentication tag so a wrong key
//!    or a tampered body is detected at unseal time.
//!
//! 2. **Caller binding**: a proof tying a ciphertext to the principal that
//!    submitted it, so one bidder cannot replay another bidder's ciphertext
//!    as their own.
//!
//! The keystream is SHA-256 in counter mode. This is a development stand-in
//! with the same interface shape a real homomorphic scheme would have; the
//! rest of the workspace treats ciphertexts as fully opaque either way.

pub mod binding;
pub mod cipher;
pub mod error;

pub use binding::{prove_binding, verify_binding};
pub use cipher::{seal, unseal, SealKey};
pub use error::SealError;
