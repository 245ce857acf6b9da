//! Client SDK for bidding in confidential auctions.
//!
//! This crate provides a high-level API for:
//! - Sealing bid amounts with a caller-binding proof
//! - Building the calls submitted to the auction engine
//! - Interpreting query responses

pub mod bid;
pub mod query;

pub use bid::{create_bid, BidBuilder, BidError, PreparedBid};
