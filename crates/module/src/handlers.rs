//! Call handlers for the auction engine.
//!
//! Every handler validates first and mutates last: a returned error means
//! no auction, bid, or capability state changed. The host is expected to
//! deliver an authenticated [`CallContext`] with each call.

use veil_types::{
    compute_correlation_token, AuctionKind, AuctionPhase, AuctionRecord, BidRecord,
    CorrelationToken, DisclosureEntry, DisclosureRequest, ImportProof, Principal,
    SealedCiphertext, TypeTag,
};

use crate::error::AuctionError;
use crate::state::{EngineState, PendingDisclosure};
use crate::winner::determine_winner;

/// Authenticated call environment supplied by the host.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub sender: Principal,
    pub block_height: u64,
    /// Unix timestamp (seconds); all deadlines compare against this
    pub timestamp: u64,
}

pub type HandlerResult<T> = Result<T, AuctionError>;

/// Create a new auction. Returns the assigned auction id.
pub fn handle_create_auction(
    state: &mut EngineState,
    ctx: &CallContext,
    kind: AuctionKind,
    item: String,
    bidding_duration: u64,
    reveal_window: u64,
    auditor: Option<Principal>,
) -> HandlerResult<u64> {
    if bidding_duration < state.params.min_bidding_duration {
        return Err(AuctionError::InvalidDuration {
            min: state.params.min_bidding_duration,
            got: bidding_duration,
        });
    }
    if reveal_window < state.params.min_reveal_window {
        return Err(AuctionError::InvalidDuration {
            min: state.params.min_reveal_window,
            got: reveal_window,
        });
    }
    // A seller reviewing their own bidders' amounts defeats the point of
    // sealed bidding.
    if auditor == Some(ctx.sender) {
        return Err(AuctionError::NotAuthorized);
    }

    let bidding_deadline = ctx
        .timestamp
        .checked_add(bidding_duration)
        .ok_or(AuctionError::DurationOverflow)?;
    let reveal_deadline = bidding_deadline
        .checked_add(reveal_window)
        .ok_or(AuctionError::DurationOverflow)?;

    let auction_id = state.allocate_auction_id();
    state.auctions.insert(
        auction_id,
        AuctionRecord {
            auction_id,
            seller: ctx.sender,
            kind,
            phase: AuctionPhase::Created,
            item,
            created_at: ctx.timestamp,
            bidding_deadline,
            reveal_deadline,
            auditor,
            winner: None,
            clearing_price: None,
            disclosure_token: None,
        },
    );
    Ok(auction_id)
}

/// Submit an encrypted bid. The ciphertext must carry a binding proof tying
/// it to the sender; on success the bid amount enters the value store and
/// the engine receives a persistent `Use` grant on it. Returns the opaque
/// value id of the stored amount.
pub fn handle_place_bid(
    state: &mut EngineState,
    ctx: &CallContext,
    auction_id: u64,
    ciphertext: SealedCiphertext,
    proof: &ImportProof,
) -> HandlerResult<u64> {
    let auction = state
        .auctions
        .get(&auction_id)
        .ok_or(AuctionError::UnknownAuction(auction_id))?;

    if !auction.accepts_bids() || ctx.timestamp >= auction.bidding_deadline {
        return Err(AuctionError::BiddingClosed);
    }
    if ctx.sender == auction.seller {
        return Err(AuctionError::NotAuthorized);
    }
    if auction.auditor == Some(ctx.sender) {
        return Err(AuctionError::NotAuthorized);
    }
    if state.has_bid(auction_id, &ctx.sender) {
        return Err(AuctionError::AlreadyBid);
    }
    let auditor = auction.auditor;
    let engine = state.engine_principal;

    let amount_value =
        state
            .evaluator
            .import_external(ctx.sender, ciphertext, proof, TypeTag::Uint32)?;

    // Bidder-driven propagation: the engine may fold over the amount, the
    // auditor (if any) may later request its plaintext. Neither grant is
    // implied by import.
    let scope = veil_types::CapabilityScope::Persistent;
    state
        .evaluator
        .grant_use(ctx.sender, amount_value, engine, scope)?;
    if let Some(auditor) = auditor {
        state
            .evaluator
            .grant_disclose(ctx.sender, amount_value, auditor, scope)?;
    }

    let auction = state
        .auctions
        .get_mut(&auction_id)
        .ok_or(AuctionError::UnknownAuction(auction_id))?;
    if auction.phase == AuctionPhase::Created {
        auction.phase = AuctionPhase::Bidding;
    }

    state.bids.entry(auction_id).or_default().push(BidRecord {
        auction_id,
        bidder: ctx.sender,
        amount_value,
        submitted_at: ctx.timestamp,
    });
    Ok(amount_value)
}

/// Close bidding and run the oblivious winner fold. Permissionless: any
/// caller may crank an auction once its bidding deadline has passed.
///
/// Produces the [`DisclosureRequest`] handed to the decryption gateway and
/// moves the auction to `Evaluating`. The gateway's `Disclose` grants are
/// transaction-scoped and are already expired by the time this returns;
/// the exported ciphertexts in the request are all it gets.
pub fn handle_begin_evaluation(
    state: &mut EngineState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<DisclosureRequest> {
    let auction = state
        .auctions
        .get(&auction_id)
        .ok_or(AuctionError::UnknownAuction(auction_id))?;

    if !auction.accepts_bids() {
        return Err(AuctionError::InvalidPhase {
            expected: AuctionPhase::Bidding,
            got: auction.phase,
        });
    }
    if ctx.timestamp < auction.bidding_deadline {
        return Err(AuctionError::BiddingStillOpen);
    }
    if ctx.timestamp >= auction.reveal_deadline {
        return Err(AuctionError::RevealWindowClosed);
    }
    let kind = auction.kind;

    let amounts: Vec<u64> = state
        .auction_bids(auction_id)
        .iter()
        .map(|bid| bid.amount_value)
        .collect();

    let engine = state.engine_principal;
    let gateway = state.gateway_principal;
    let values = determine_winner(&mut state.evaluator, engine, &amounts, kind)?;

    let scope = state.evaluator.transaction_scope();
    state
        .evaluator
        .grant_disclose(engine, values.winner_index, gateway, scope)?;
    state
        .evaluator
        .grant_disclose(engine, values.clearing_price, gateway, scope)?;

    let (winner_tag, winner_ct) = state
        .evaluator
        .disclose_ciphertext(gateway, values.winner_index)?;
    let (price_tag, price_ct) = state
        .evaluator
        .disclose_ciphertext(gateway, values.clearing_price)?;

    state.evaluator.advance_transaction();

    let token = compute_correlation_token(auction_id, values.winner_index, values.clearing_price);
    let auction = state
        .auctions
        .get_mut(&auction_id)
        .ok_or(AuctionError::UnknownAuction(auction_id))?;
    auction.phase = AuctionPhase::Evaluating;
    auction.disclosure_token = Some(token);

    state.pending_disclosures.insert(
        token,
        PendingDisclosure {
            auction_id,
            winner_value: values.winner_index,
            price_value: values.clearing_price,
            requested_at: ctx.timestamp,
        },
    );

    Ok(DisclosureRequest {
        token,
        auction_id,
        winner_index: DisclosureEntry {
            value_id: values.winner_index,
            tag: winner_tag,
            ciphertext: winner_ct,
        },
        clearing_price: DisclosureEntry {
            value_id: values.clearing_price,
            tag: price_tag,
            ciphertext: price_ct,
        },
    })
}

/// Gateway callback delivering the decrypted winner index and clearing
/// price. Idempotent per token: a redelivery after success returns
/// `AlreadyFinalized` and changes nothing.
pub fn handle_finalize(
    state: &mut EngineState,
    ctx: &CallContext,
    token: CorrelationToken,
    winner_index: u32,
    clearing_price: u64,
) -> HandlerResult<()> {
    if state.completed_tokens.contains(&token) {
        return Err(AuctionError::AlreadyFinalized);
    }
    let pending = state
        .pending_disclosures
        .get(&token)
        .ok_or(AuctionError::UnknownRequest)?;
    if ctx.sender != state.gateway_principal {
        return Err(AuctionError::NotAuthorized);
    }
    let auction_id = pending.auction_id;

    let bids = state.auction_bids(auction_id);
    let bid_count = bids.len();
    let winner = bids
        .get(winner_index as usize)
        .map(|bid| bid.bidder)
        .ok_or(AuctionError::WinnerOutOfRange {
            index: winner_index,
            bids: bid_count,
        })?;

    let auction = state
        .auctions
        .get_mut(&auction_id)
        .ok_or(AuctionError::UnknownAuction(auction_id))?;
    if auction.phase != AuctionPhase::Evaluating {
        return Err(AuctionError::InvalidPhase {
            expected: AuctionPhase::Evaluating,
            got: auction.phase,
        });
    }

    auction.winner = Some(winner);
    auction.clearing_price = Some(clearing_price);
    auction.phase = AuctionPhase::Revealed;

    state.pending_disclosures.remove(&token);
    state.completed_tokens.insert(token);
    Ok(())
}

/// Seller-initiated cancellation, allowed only while bidding is open.
pub fn handle_cancel_auction(
    state: &mut EngineState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<()> {
    let auction = state
        .auctions
        .get_mut(&auction_id)
        .ok_or(AuctionError::UnknownAuction(auction_id))?;

    if ctx.sender != auction.seller {
        return Err(AuctionError::NotAuthorized);
    }
    if !auction.accepts_bids() || ctx.timestamp >= auction.bidding_deadline {
        return Err(AuctionError::TooLateToCancel);
    }

    auction.phase = AuctionPhase::Cancelled;
    Ok(())
}

/// Recovery path for auctions that can no longer make progress: once the
/// reveal deadline passes, anyone may expire a non-terminal auction. That
/// covers both a stuck `Evaluating` auction whose disclosure callback never
/// arrived and one that closed bidding with too few bids to ever evaluate.
/// Any outstanding request is dropped so a late callback hits
/// `UnknownRequest` instead of finalizing a cancelled auction.
pub fn handle_expire_evaluation(
    state: &mut EngineState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<()> {
    let auction = state
        .auctions
        .get_mut(&auction_id)
        .ok_or(AuctionError::UnknownAuction(auction_id))?;

    if auction.is_terminal() {
        return Err(AuctionError::InvalidPhase {
            expected: AuctionPhase::Evaluating,
            got: auction.phase,
        });
    }
    if ctx.timestamp <= auction.reveal_deadline {
        return Err(AuctionError::RevealWindowStillOpen);
    }

    auction.phase = AuctionPhase::Cancelled;
    let token = auction.disclosure_token.take();
    if let Some(token) = token {
        state.pending_disclosures.remove(&token);
    }
    Ok(())
}
