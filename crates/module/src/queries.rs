//! Read-only queries over engine state.
//!
//! Responses expose only public auction metadata. Bid amounts exist solely
//! as opaque value ids and never cross this boundary; the winner and
//! clearing price appear only once an auction reaches `Revealed`.

use serde::{Deserialize, Serialize};

use veil_types::{AuctionKind, AuctionPhase, AuctionRecord, CorrelationToken, Principal};

use crate::state::EngineState;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    GetAuction { auction_id: u64 },
    GetOutcome { auction_id: u64 },
    GetBidCount { auction_id: u64 },
    ListActiveAuctions,
    ListPendingDisclosures,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    Auction(Option<AuctionSummary>),
    Outcome(Option<AuctionOutcome>),
    BidCount(Option<u64>),
    ActiveAuctions(Vec<AuctionSummary>),
    PendingDisclosures(Vec<CorrelationToken>),
}

/// Public view of an auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub seller: Principal,
    pub kind: AuctionKind,
    pub phase: AuctionPhase,
    pub item: String,
    pub bidding_deadline: u64,
    pub reveal_deadline: u64,
    pub bid_count: u64,
    pub winner: Option<Principal>,
    pub clearing_price: Option<u64>,
}

/// Final result of a revealed auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionOutcome {
    pub auction_id: u64,
    pub winner: Principal,
    pub clearing_price: u64,
}

pub fn handle_query(state: &EngineState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetAuction { auction_id } => AuctionQueryResponse::Auction(
            state
                .get_auction(auction_id)
                .map(|auction| summarize(state, auction)),
        ),
        AuctionQuery::GetOutcome { auction_id } => {
            AuctionQueryResponse::Outcome(state.get_auction(auction_id).and_then(outcome))
        }
        AuctionQuery::GetBidCount { auction_id } => AuctionQueryResponse::BidCount(
            state
                .get_auction(auction_id)
                .map(|_| state.auction_bids(auction_id).len() as u64),
        ),
        AuctionQuery::ListActiveAuctions => {
            let mut active: Vec<AuctionSummary> = state
                .auctions
                .values()
                .filter(|auction| !auction.is_terminal())
                .map(|auction| summarize(state, auction))
                .collect();
            active.sort_by_key(|summary| summary.auction_id);
            AuctionQueryResponse::ActiveAuctions(active)
        }
        AuctionQuery::ListPendingDisclosures => {
            let mut tokens: Vec<CorrelationToken> =
                state.pending_disclosures.keys().copied().collect();
            tokens.sort();
            AuctionQueryResponse::PendingDisclosures(tokens)
        }
    }
}

fn summarize(state: &EngineState, auction: &AuctionRecord) -> AuctionSummary {
    AuctionSummary {
        auction_id: auction.auction_id,
        seller: auction.seller,
        kind: auction.kind,
        phase: auction.phase,
        item: auction.item.clone(),
        bidding_deadline: auction.bidding_deadline,
        reveal_deadline: auction.reveal_deadline,
        bid_count: state.auction_bids(auction.auction_id).len() as u64,
        winner: auction.winner,
        clearing_price: auction.clearing_price,
    }
}

fn outcome(auction: &AuctionRecord) -> Option<AuctionOutcome> {
    match (auction.phase, auction.winner, auction.clearing_price) {
        (AuctionPhase::Revealed, Some(winner), Some(clearing_price)) => Some(AuctionOutcome {
            auction_id: auction.auction_id,
            winner,
            clearing_price,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::{DefaultAuctionParams, EngineGenesisConfig};
    use crate::handlers::{
        handle_begin_evaluation, handle_cancel_auction, handle_create_auction, handle_finalize,
        handle_place_bid, CallContext,
    };
    use veil_seal::{prove_binding, seal, SealKey};
    use veil_types::Plaintext;

    const ENGINE: Principal = [0xEE; 32];
    const GATEWAY: Principal = [0xDD; 32];
    const SELLER: Principal = [1u8; 32];
    const ALICE: Principal = [2u8; 32];
    const KEY: [u8; 32] = [42u8; 32];

    fn test_state() -> EngineState {
        EngineState::new(EngineGenesisConfig {
            engine_principal: ENGINE,
            gateway_principal: GATEWAY,
            seal_key: KEY,
            default_params: DefaultAuctionParams::default(),
        })
        .unwrap()
    }

    fn ctx(sender: Principal, timestamp: u64) -> CallContext {
        CallContext {
            sender,
            block_height: 1,
            timestamp,
        }
    }

    fn create(state: &mut EngineState) -> u64 {
        handle_create_auction(
            state,
            &ctx(SELLER, 1000),
            AuctionKind::FirstPrice,
            "one lot".to_string(),
            3600,
            600,
            None,
        )
        .unwrap()
    }

    fn bid(state: &mut EngineState, auction_id: u64, bidder: Principal, amount: u32) {
        let ct = seal(
            &SealKey::from_bytes(KEY),
            [bidder[0]; 16],
            &Plaintext::Uint32(amount).to_bytes(),
        );
        let proof = prove_binding(&bidder, &ct);
        handle_place_bid(state, &ctx(bidder, 2000), auction_id, ct, &proof).unwrap();
    }

    #[test]
    fn test_get_auction_and_bid_count() {
        let mut state = test_state();
        let id = create(&mut state);
        bid(&mut state, id, ALICE, 100);

        let response = handle_query(&state, AuctionQuery::GetAuction { auction_id: id });
        let AuctionQueryResponse::Auction(Some(summary)) = response else {
            panic!("expected auction summary");
        };
        assert_eq!(summary.bid_count, 1);
        assert_eq!(summary.phase, AuctionPhase::Bidding);
        assert_eq!(summary.winner, None);

        assert_eq!(
            handle_query(&state, AuctionQuery::GetBidCount { auction_id: id }),
            AuctionQueryResponse::BidCount(Some(1))
        );
        assert_eq!(
            handle_query(&state, AuctionQuery::GetAuction { auction_id: 99 }),
            AuctionQueryResponse::Auction(None)
        );
    }

    #[test]
    fn test_outcome_only_after_reveal() {
        let mut state = test_state();
        let id = create(&mut state);
        bid(&mut state, id, ALICE, 100);

        assert_eq!(
            handle_query(&state, AuctionQuery::GetOutcome { auction_id: id }),
            AuctionQueryResponse::Outcome(None)
        );

        let request = handle_begin_evaluation(&mut state, &ctx(ALICE, 4700), id).unwrap();
        assert_eq!(
            handle_query(&state, AuctionQuery::GetOutcome { auction_id: id }),
            AuctionQueryResponse::Outcome(None)
        );

        handle_finalize(&mut state, &ctx(GATEWAY, 4800), request.token, 0, 100).unwrap();
        assert_eq!(
            handle_query(&state, AuctionQuery::GetOutcome { auction_id: id }),
            AuctionQueryResponse::Outcome(Some(AuctionOutcome {
                auction_id: id,
                winner: ALICE,
                clearing_price: 100,
            }))
        );
    }

    #[test]
    fn test_active_auctions_exclude_terminal() {
        let mut state = test_state();
        let first = create(&mut state);
        let second = create(&mut state);

        handle_cancel_auction(&mut state, &ctx(SELLER, 2000), first).unwrap();

        let response = handle_query(&state, AuctionQuery::ListActiveAuctions);
        let AuctionQueryResponse::ActiveAuctions(active) = response else {
            panic!("expected active auction list");
        };
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].auction_id, second);
    }

    #[test]
    fn test_pending_disclosures_listed() {
        let mut state = test_state();
        let id = create(&mut state);
        bid(&mut state, id, ALICE, 100);
        let request = handle_begin_evaluation(&mut state, &ctx(ALICE, 4700), id).unwrap();

        assert_eq!(
            handle_query(&state, AuctionQuery::ListPendingDisclosures),
            AuctionQueryResponse::PendingDisclosures(vec![request.token])
        );
    }
}
