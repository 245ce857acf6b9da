//! Auction module error types.

use thiserror::Error;

use veil_oracle::OracleError;
use veil_types::AuctionPhase;

/// Errors that can occur in the auction module.
///
/// Every failure aborts the enclosing call with no partial state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    UnknownAuction(u64),

    #[error("Invalid duration: minimum {min}, got {got}")]
    InvalidDuration { min: u64, got: u64 },

    #[error("Auction deadlines overflow")]
    DurationOverflow,

    #[error("Bidding period ended")]
    BiddingClosed,

    #[error("Bidding period still open")]
    BiddingStillOpen,

    #[error("Reveal window closed")]
    RevealWindowClosed,

    #[error("Reveal window still open")]
    RevealWindowStillOpen,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Already submitted bid")]
    AlreadyBid,

    #[error("Insufficient bids: need {required}, got {got}")]
    InsufficientBids { required: usize, got: usize },

    #[error("Already finalized")]
    AlreadyFinalized,

    #[error("Unknown disclosure request")]
    UnknownRequest,

    #[error("Too late to cancel")]
    TooLateToCancel,

    #[error("Winner index {index} out of range for {bids} bids")]
    WinnerOutOfRange { index: u32, bids: usize },

    #[error("Invalid phase. Expected: {expected:?}, Got: {got:?}")]
    InvalidPhase {
        expected: AuctionPhase,
        got: AuctionPhase,
    },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}
