//! Sealed-bid auction module over the confidential evaluation oracle.
//!
//! This crate implements the host-side logic for confidential auctions:
//!
//! - Auction creation with configurable timing
//! - Encrypted bid submission with caller-binding proofs
//! - Oblivious winner determination (first-price and Vickrey)
//! - Selective disclosure of exactly the winner and the clearing price
//! - Idempotent finalization driven by the external decryption gateway
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `winner`: The oblivious winner-determination fold
//! - `queries`: Read-only state access
//! - `state`: Engine state structures
//! - `genesis`: Initial configuration
//! - `error`: Error types

pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;
pub mod winner;

pub use call::{dispatch, AuctionCall, CallOutcome};
pub use error::AuctionError;
pub use genesis::{DefaultAuctionParams, EngineGenesisConfig, GenesisValidationError};
pub use handlers::{CallContext, HandlerResult};
pub use queries::{handle_query, AuctionOutcome, AuctionQuery, AuctionQueryResponse, AuctionSummary};
pub use state::{EngineState, PendingDisclosure};
pub use winner::{determine_winner, WinnerValues};
