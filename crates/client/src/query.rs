//! Helpers for interpreting engine query responses.

use veil_module::{AuctionOutcome, AuctionQuery, AuctionQueryResponse, AuctionSummary};

/// Query for an auction's public summary.
pub fn auction_query(auction_id: u64) -> AuctionQuery {
    AuctionQuery::GetAuction { auction_id }
}

/// Query for a revealed auction's outcome.
pub fn outcome_query(auction_id: u64) -> AuctionQuery {
    AuctionQuery::GetOutcome { auction_id }
}

/// Unpack an auction summary response.
pub fn auction_summary(response: AuctionQueryResponse) -> Option<AuctionSummary> {
    match response {
        AuctionQueryResponse::Auction(summary) => summary,
        _ => None,
    }
}

/// Unpack an outcome response. `None` until the auction is revealed.
pub fn auction_outcome(response: AuctionQueryResponse) -> Option<AuctionOutcome> {
    match response {
        AuctionQueryResponse::Outcome(outcome) => outcome,
        _ => None,
    }
}

/// Unpack a bid count response.
pub fn bid_count(response: AuctionQueryResponse) -> Option<u64> {
    match response {
        AuctionQueryResponse::BidCount(count) => count,
        _ => None,
    }
}
