//! Confidential evaluation context for the auction engine.
//!
//! Three pieces live here, owned together by one [`Evaluator`]:
//!
//! - the **capability registry**: which principals may use an opaque value
//!   as an operand, and which may request its disclosure;
//! - the **opaque value store**: write-once sealed values, each carrying a
//!   type tag and its creator;
//! - the **operation oracle**: the fixed set of permitted operations
//!   (arithmetic, comparison, boolean logic, oblivious selection).
//!
//! Every operation checks its operands' `Use` capabilities before touching
//! them, and every result is created with zero capabilities; the calling
//! principal must explicitly propagate rights to it. Nothing in this crate
//! exposes a plaintext except through a `Disclose`-gated ciphertext export.

pub mod error;
pub mod ops;
pub mod registry;
pub mod store;

pub use error::OracleError;
pub use ops::Evaluator;
pub use registry::CapabilityRegistry;
pub use store::{StoredValue, ValueStore};
