//! Oracle error types.

use thiserror::Error;

use veil_types::TypeTag;

/// Errors that can occur in the evaluation context.
///
/// Every failure aborts the enclosing operation with no partial state
/// change; there is no rollback narrower than the operation itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("Unknown value: {0}")]
    UnknownValue(u64),

    #[error("Not authorized for value {value_id}")]
    NotAuthorized { value_id: u64 },

    #[error("Operand type mismatch: expected {expected:?}, got {got:?}")]
    TypeMismatch { expected: TypeTag, got: TypeTag },

    #[error("Import proof failed validation")]
    InvalidProof,

    #[error("Stored ciphertext failed authentication for value {0}")]
    CorruptValue(u64),
}
