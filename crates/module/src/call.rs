//! Call messages accepted by the auction engine.

use borsh::{BorshDeserialize, BorshSerialize};

use veil_types::{
    AuctionKind, CorrelationToken, DisclosureRequest, ImportProof, Principal, SealedCiphertext,
};

use crate::handlers::{
    handle_begin_evaluation, handle_cancel_auction, handle_create_auction,
    handle_expire_evaluation, handle_finalize, handle_place_bid, CallContext, HandlerResult,
};
use crate::state::EngineState;

/// A state-changing call, dispatched to the matching handler.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    CreateAuction {
        kind: AuctionKind,
        item: String,
        bidding_duration: u64,
        reveal_window: u64,
        auditor: Option<Principal>,
    },
    PlaceBid {
        auction_id: u64,
        ciphertext: SealedCiphertext,
        proof: ImportProof,
    },
    BeginEvaluation {
        auction_id: u64,
    },
    /// Gateway callback with the decrypted winner index and clearing price
    Finalize {
        token: CorrelationToken,
        winner_index: u32,
        clearing_price: u64,
    },
    CancelAuction {
        auction_id: u64,
    },
    ExpireEvaluation {
        auction_id: u64,
    },
}

/// Result of a successfully dispatched call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    AuctionCreated { auction_id: u64 },
    BidPlaced { amount_value: u64 },
    EvaluationStarted(Box<DisclosureRequest>),
    Finalized,
    Cancelled,
    Expired,
}

/// Route a call to its handler.
pub fn dispatch(
    state: &mut EngineState,
    ctx: &CallContext,
    call: AuctionCall,
) -> HandlerResult<CallOutcome> {
    match call {
        AuctionCall::CreateAuction {
            kind,
            item,
            bidding_duration,
            reveal_window,
            auditor,
        } => handle_create_auction(state, ctx, kind, item, bidding_duration, reveal_window, auditor)
            .map(|auction_id| CallOutcome::AuctionCreated { auction_id }),
        AuctionCall::PlaceBid {
            auction_id,
            ciphertext,
            proof,
        } => handle_place_bid(state, ctx, auction_id, ciphertext, &proof)
            .map(|amount_value| CallOutcome::BidPlaced { amount_value }),
        AuctionCall::BeginEvaluation { auction_id } => {
            handle_begin_evaluation(state, ctx, auction_id)
                .map(|request| CallOutcome::EvaluationStarted(Box::new(request)))
        }
        AuctionCall::Finalize {
            token,
            winner_index,
            clearing_price,
        } => handle_finalize(state, ctx, token, winner_index, clearing_price)
            .map(|()| CallOutcome::Finalized),
        AuctionCall::CancelAuction { auction_id } => {
            handle_cancel_auction(state, ctx, auction_id).map(|()| CallOutcome::Cancelled)
        }
        AuctionCall::ExpireEvaluation { auction_id } => {
            handle_expire_evaluation(state, ctx, auction_id).map(|()| CallOutcome::Expired)
        }
    }
}
