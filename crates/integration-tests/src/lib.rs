//! End-to-end integration tests for the confidential auction engine.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Engine genesis
//! 2. Auction creation
//! 3. Bid sealing and submission via the client SDK
//! 4. Oblivious winner determination
//! 5. Gateway decryption and the finalize callback

use rand::rngs::OsRng;

use veil_client::create_bid;
use veil_gateway::{DisclosureGateway, FinalizeCallback, RequestPhase};
use veil_module::{
    dispatch, handle_query, AuctionCall, AuctionError, AuctionQuery, AuctionQueryResponse,
    CallContext, CallOutcome, DefaultAuctionParams, EngineGenesisConfig, EngineState,
};
use veil_seal::SealKey;
use veil_types::{
    AuctionKind, AuctionPhase, CapabilityKind, CorrelationToken, DisclosureRequest, Principal,
};

const ENGINE: Principal = [0xEE; 32];
const GATEWAY: Principal = [0xDD; 32];
const SELLER: Principal = [1u8; 32];
const ALICE: Principal = [2u8; 32];
const BOB: Principal = [3u8; 32];
const CAROL: Principal = [4u8; 32];
const SEAL_KEY: [u8; 32] = [42u8; 32];

fn engine() -> EngineState {
    EngineState::new(EngineGenesisConfig {
        engine_principal: ENGINE,
        gateway_principal: GATEWAY,
        seal_key: SEAL_KEY,
        default_params: DefaultAuctionParams::default(),
    })
    .expect("genesis config is valid")
}

fn gateway() -> DisclosureGateway {
    DisclosureGateway::new(SealKey::from_bytes(SEAL_KEY))
}

fn ctx(sender: Principal, timestamp: u64) -> CallContext {
    CallContext {
        sender,
        block_height: timestamp / 10,
        timestamp,
    }
}

/// Finalize callback that feeds plaintexts straight back into the engine,
/// the way the host would route a gateway transaction.
struct EngineCallback<'a> {
    state: &'a mut EngineState,
    timestamp: u64,
}

impl FinalizeCallback for EngineCallback<'_> {
    type Error = AuctionError;

    fn finalize(
        &mut self,
        token: CorrelationToken,
        winner_index: u32,
        clearing_price: u64,
    ) -> Result<(), AuctionError> {
        let call_ctx = ctx(GATEWAY, self.timestamp);
        dispatch(
            self.state,
            &call_ctx,
            AuctionCall::Finalize {
                token,
                winner_index,
                clearing_price,
            },
        )
        .map(|_| ())
    }
}

/// Create an auction at t=1000 with minimum durations: bidding closes at
/// 4600, the reveal window ends at 5200.
fn create_auction(state: &mut EngineState, kind: AuctionKind) -> u64 {
    let outcome = dispatch(
        state,
        &ctx(SELLER, 1000),
        AuctionCall::CreateAuction {
            kind,
            item: "one lot of widgets".to_string(),
            bidding_duration: 3600,
            reveal_window: 600,
            auditor: None,
        },
    )
    .expect("create auction");
    match outcome {
        CallOutcome::AuctionCreated { auction_id } => auction_id,
        other => panic!("unexpected outcome {other:?}"),
    }
}

fn place_bid(state: &mut EngineState, auction_id: u64, bidder: Principal, amount: u64) -> u64 {
    let prepared = create_bid(&SealKey::from_bytes(SEAL_KEY), &bidder, amount, &mut OsRng)
        .expect("seal bid");
    let outcome = dispatch(
        state,
        &ctx(bidder, 2000),
        prepared.into_call(auction_id),
    )
    .expect("place bid");
    match outcome {
        CallOutcome::BidPlaced { amount_value } => amount_value,
        other => panic!("unexpected outcome {other:?}"),
    }
}

fn begin_evaluation(state: &mut EngineState, auction_id: u64) -> DisclosureRequest {
    let outcome = dispatch(
        state,
        &ctx(CAROL, 4700),
        AuctionCall::BeginEvaluation { auction_id },
    )
    .expect("begin evaluation");
    match outcome {
        CallOutcome::EvaluationStarted(request) => *request,
        other => panic!("unexpected outcome {other:?}"),
    }
}

/// Run the gateway leg: accept, decrypt, and deliver back to the engine.
fn run_gateway(state: &mut EngineState, request: DisclosureRequest) {
    let mut gw = gateway();
    let token = request.token;
    gw.accept(request).expect("accept request");
    gw.process(token).expect("decrypt request");

    let mut callback = EngineCallback {
        state,
        timestamp: 4800,
    };
    gw.deliver(token, &mut callback).expect("deliver outcome");
    assert_eq!(gw.phase(&token), Some(RequestPhase::Delivered));
}

#[test]
fn test_full_first_price_flow() {
    let mut state = engine();

    // ========================================
    // Phase 1: Create auction and collect bids
    // ========================================

    let auction_id = create_auction(&mut state, AuctionKind::FirstPrice);
    place_bid(&mut state, auction_id, ALICE, 100);
    place_bid(&mut state, auction_id, BOB, 200);
    place_bid(&mut state, auction_id, CAROL, 150);

    println!("Auction {auction_id} collected 3 sealed bids");

    // ========================================
    // Phase 2: Close bidding and evaluate
    // ========================================

    let request = begin_evaluation(&mut state, auction_id);
    assert_eq!(
        state.get_auction(auction_id).unwrap().phase,
        AuctionPhase::Evaluating
    );

    // ========================================
    // Phase 3: Gateway decrypts and finalizes
    // ========================================

    run_gateway(&mut state, request);

    let auction = state.get_auction(auction_id).unwrap();
    assert_eq!(auction.phase, AuctionPhase::Revealed);
    assert_eq!(auction.winner, Some(BOB));
    assert_eq!(auction.clearing_price, Some(200));

    println!("Auction {auction_id} revealed: winner pays 200");
}

#[test]
fn test_full_second_price_flow() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::SecondPrice);
    place_bid(&mut state, auction_id, ALICE, 30);
    place_bid(&mut state, auction_id, BOB, 50);
    place_bid(&mut state, auction_id, CAROL, 20);

    let request = begin_evaluation(&mut state, auction_id);
    run_gateway(&mut state, request);

    // Vickrey: Bob wins but pays Alice's 30
    let auction = state.get_auction(auction_id).unwrap();
    assert_eq!(auction.winner, Some(BOB));
    assert_eq!(auction.clearing_price, Some(30));
}

#[test]
fn test_tie_goes_to_earlier_bidder() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::FirstPrice);
    place_bid(&mut state, auction_id, ALICE, 10);
    place_bid(&mut state, auction_id, BOB, 10);
    place_bid(&mut state, auction_id, CAROL, 5);

    let request = begin_evaluation(&mut state, auction_id);
    run_gateway(&mut state, request);

    let auction = state.get_auction(auction_id).unwrap();
    assert_eq!(auction.winner, Some(ALICE));
    assert_eq!(auction.clearing_price, Some(10));
}

#[test]
fn test_extreme_amounts_round_trip() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::FirstPrice);
    place_bid(&mut state, auction_id, ALICE, 0);
    place_bid(&mut state, auction_id, BOB, u64::from(u32::MAX));

    let request = begin_evaluation(&mut state, auction_id);
    run_gateway(&mut state, request);

    let auction = state.get_auction(auction_id).unwrap();
    assert_eq!(auction.winner, Some(BOB));
    assert_eq!(auction.clearing_price, Some(u64::from(u32::MAX)));
}

#[test]
fn test_bidders_cannot_read_each_other() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::FirstPrice);
    let alice_value = place_bid(&mut state, auction_id, ALICE, 100);
    let bob_value = place_bid(&mut state, auction_id, BOB, 200);

    // No cross-bidder capability exists, in either direction
    assert!(!state.evaluator.check(alice_value, BOB, CapabilityKind::Use));
    assert!(!state.evaluator.check(bob_value, ALICE, CapabilityKind::Use));

    // Operating on a foreign bid fails even for its subject
    assert!(state.evaluator.gt(BOB, alice_value, bob_value).is_err());

    // And nobody, engine included, holds Disclose on a raw bid
    for principal in [ALICE, BOB, SELLER, ENGINE, GATEWAY] {
        assert!(!state
            .evaluator
            .check(alice_value, principal, CapabilityKind::Disclose));
    }
}

#[test]
fn test_disclosure_is_minimal() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::SecondPrice);
    let alice_value = place_bid(&mut state, auction_id, ALICE, 30);
    let bob_value = place_bid(&mut state, auction_id, BOB, 50);

    let request = begin_evaluation(&mut state, auction_id);

    // Exactly two entries leave the engine, and neither is a stored bid
    let exported = [
        request.winner_index.value_id,
        request.clearing_price.value_id,
    ];
    assert!(!exported.contains(&alice_value));
    assert!(!exported.contains(&bob_value));

    // The gateway's grants were scoped to the evaluation transaction
    for value_id in exported {
        assert!(!state
            .evaluator
            .check(value_id, GATEWAY, CapabilityKind::Disclose));
    }

    // Raw bid ciphertexts stay locked to the gateway even with the key in
    // hand: the engine never exports them
    assert!(state
        .evaluator
        .disclose_ciphertext(GATEWAY, alice_value)
        .is_err());
}

#[test]
fn test_single_bid_vickrey_fails_cleanly() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::SecondPrice);
    place_bid(&mut state, auction_id, ALICE, 100);

    let result = dispatch(
        &mut state,
        &ctx(CAROL, 4700),
        AuctionCall::BeginEvaluation { auction_id },
    );
    assert_eq!(
        result,
        Err(AuctionError::InsufficientBids {
            required: 2,
            got: 1,
        })
    );

    // The auction is untouched and can still take a second bid via retry
    assert_eq!(
        state.get_auction(auction_id).unwrap().phase,
        AuctionPhase::Bidding
    );

    // Once the reveal window lapses, anyone may close it out so it stops
    // occupying the active list
    dispatch(
        &mut state,
        &ctx(BOB, 5300),
        AuctionCall::ExpireEvaluation { auction_id },
    )
    .unwrap();
    assert_eq!(
        state.get_auction(auction_id).unwrap().phase,
        AuctionPhase::Cancelled
    );
    let response = handle_query(&state, AuctionQuery::ListActiveAuctions);
    assert_eq!(response, AuctionQueryResponse::ActiveAuctions(vec![]));
}

#[test]
fn test_redelivered_callback_changes_nothing() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::FirstPrice);
    place_bid(&mut state, auction_id, ALICE, 100);

    let request = begin_evaluation(&mut state, auction_id);
    let token = request.token;

    let mut gw = gateway();
    gw.accept(request).unwrap();
    let outcome = gw.process(token).unwrap();

    let mut callback = EngineCallback {
        state: &mut state,
        timestamp: 4800,
    };
    callback.finalize(token, outcome.winner_index, outcome.clearing_price).unwrap();

    // Second delivery, this time with corrupted numbers
    let redelivery = callback.finalize(token, 0, 999_999);
    assert_eq!(redelivery, Err(AuctionError::AlreadyFinalized));

    let auction = state.get_auction(auction_id).unwrap();
    assert_eq!(auction.clearing_price, Some(100));
}

#[test]
fn test_expired_evaluation_rejects_late_callback() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::FirstPrice);
    place_bid(&mut state, auction_id, ALICE, 100);
    let request = begin_evaluation(&mut state, auction_id);

    // Reveal deadline (5200) passes with no callback; anyone may expire
    dispatch(
        &mut state,
        &ctx(BOB, 5300),
        AuctionCall::ExpireEvaluation { auction_id },
    )
    .unwrap();
    assert_eq!(
        state.get_auction(auction_id).unwrap().phase,
        AuctionPhase::Cancelled
    );

    // The gateway's late delivery now has nowhere to land
    let late = dispatch(
        &mut state,
        &ctx(GATEWAY, 5400),
        AuctionCall::Finalize {
            token: request.token,
            winner_index: 0,
            clearing_price: 100,
        },
    );
    assert_eq!(late, Err(AuctionError::UnknownRequest));
}

#[test]
fn test_queries_track_lifecycle() {
    let mut state = engine();
    let auction_id = create_auction(&mut state, AuctionKind::FirstPrice);
    place_bid(&mut state, auction_id, ALICE, 100);

    let response = handle_query(&state, AuctionQuery::GetOutcome { auction_id });
    assert_eq!(response, AuctionQueryResponse::Outcome(None));

    let request = begin_evaluation(&mut state, auction_id);
    run_gateway(&mut state, request);

    let outcome = veil_client::query::auction_outcome(handle_query(
        &state,
        veil_client::query::outcome_query(auction_id),
    ))
    .expect("auction revealed");
    assert_eq!(outcome.winner, ALICE);
    assert_eq!(outcome.clearing_price, 100);

    // Revealed auctions drop out of the active list
    let response = handle_query(&state, AuctionQuery::ListActiveAuctions);
    assert_eq!(response, AuctionQueryResponse::ActiveAuctions(vec![]));
}

#[test]
fn test_auditor_can_review_bids_after_the_fact() {
    let mut state = engine();
    let outcome = dispatch(
        &mut state,
        &ctx(SELLER, 1000),
        AuctionCall::CreateAuction {
            kind: AuctionKind::FirstPrice,
            item: "audited lot".to_string(),
            bidding_duration: 3600,
            reveal_window: 600,
            auditor: Some(CAROL),
        },
    )
    .unwrap();
    let CallOutcome::AuctionCreated { auction_id } = outcome else {
        panic!("unexpected outcome");
    };

    let alice_value = place_bid(&mut state, auction_id, ALICE, 100);

    // The auditor may export the raw bid ciphertext; nobody else may
    assert!(state
        .evaluator
        .disclose_ciphertext(CAROL, alice_value)
        .is_ok());
    assert!(state
        .evaluator
        .disclose_ciphertext(SELLER, alice_value)
        .is_err());

    // Disclose alone does not let the auditor compute on the bid
    assert!(!state
        .evaluator
        .check(alice_value, CAROL, CapabilityKind::Use));
}
