//! Error types for sealing operations.

use thiserror::Error;

/// Errors that can occur while sealing or unsealing values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SealError {
    #[error("Ciphertext failed authentication")]
    AuthenticationFailed,
}
