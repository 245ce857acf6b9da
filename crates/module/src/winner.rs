//! Oblivious winner determination.
//!
//! Folds over the bid sequence in submission order using only oracle
//! primitives: `gt` for strict comparison and `select` for branch-free
//! updates. No plaintext comparison of bid amounts ever happens here; the
//! outputs are two fresh opaque values (encrypted winner index, encrypted
//! clearing price) and nothing else.
//!
//! Tie-break: `gt` is strict, so on an exact tie the incumbent (earlier
//! submission) keeps its position. First-submitted-wins is the defined
//! policy.

use veil_oracle::Evaluator;
use veil_types::{AuctionKind, Plaintext, Principal};

use crate::error::AuctionError;

/// Result of the fold: opaque value ids owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinnerValues {
    /// Encrypted index of the winning bid (Uint32)
    pub winner_index: u64,
    /// Encrypted clearing price (Uint32)
    pub clearing_price: u64,
}

/// Determine the winner over encrypted amounts, in submission order.
///
/// `amounts` are opaque value ids the engine holds `Use` on. Requires one
/// bid for first-price, two for second-price.
pub fn determine_winner(
    ev: &mut Evaluator,
    engine: Principal,
    amounts: &[u64],
    kind: AuctionKind,
) -> Result<WinnerValues, AuctionError> {
    let required = match kind {
        AuctionKind::FirstPrice => 1,
        AuctionKind::SecondPrice => 2,
    };
    if amounts.len() < required {
        return Err(AuctionError::InsufficientBids {
            required,
            got: amounts.len(),
        });
    }

    match kind {
        AuctionKind::FirstPrice => first_price(ev, engine, amounts),
        AuctionKind::SecondPrice => second_price(ev, engine, amounts),
    }
}

/// Grant the engine a transaction-scoped `Use` on an intermediate so the
/// next fold step may consume it; no right outlives the enclosing call.
fn keep(ev: &mut Evaluator, engine: Principal, value_id: u64) -> Result<u64, AuctionError> {
    let scope = ev.transaction_scope();
    ev.grant_use(engine, value_id, engine, scope)?;
    Ok(value_id)
}

fn first_price(
    ev: &mut Evaluator,
    engine: Principal,
    amounts: &[u64],
) -> Result<WinnerValues, AuctionError> {
    let zero = ev.from_plaintext(engine, Plaintext::Uint32(0))?;

    // Re-wrap the opening bid so the disclosed price handle never aliases
    // a stored bid amount.
    let opening = ev.add(engine, amounts[0], zero)?;
    let mut best = keep(ev, engine, opening)?;
    let mut best_index = ev.from_plaintext(engine, Plaintext::Uint32(0))?;

    for (i, &amount) in amounts.iter().enumerate().skip(1) {
        let raw_higher = ev.gt(engine, amount, best)?;
        let is_higher = keep(ev, engine, raw_higher)?;
        let index = ev.from_plaintext(engine, Plaintext::Uint32(i as u32))?;

        let next_best = ev.select(engine, is_higher, amount, best)?;
        best = keep(ev, engine, next_best)?;

        let next_index = ev.select(engine, is_higher, index, best_index)?;
        best_index = keep(ev, engine, next_index)?;
    }

    Ok(WinnerValues {
        winner_index: best_index,
        clearing_price: best,
    })
}

fn second_price(
    ev: &mut Evaluator,
    engine: Principal,
    amounts: &[u64],
) -> Result<WinnerValues, AuctionError> {
    let zero = ev.from_plaintext(engine, Plaintext::Uint32(0))?;

    let opening = ev.add(engine, amounts[0], zero)?;
    let mut best = keep(ev, engine, opening)?;
    let mut second = ev.from_plaintext(engine, Plaintext::Uint32(0))?;
    let mut best_index = ev.from_plaintext(engine, Plaintext::Uint32(0))?;

    for (i, &amount) in amounts.iter().enumerate().skip(1) {
        let raw_higher = ev.gt(engine, amount, best)?;
        let is_higher = keep(ev, engine, raw_higher)?;
        let raw_beats_second = ev.gt(engine, amount, second)?;
        let beats_second = keep(ev, engine, raw_beats_second)?;
        let index = ev.from_plaintext(engine, Plaintext::Uint32(i as u32))?;

        // Two-way cascade: a bid that beats `best` demotes the old best to
        // second place; a bid that beats only `second` replaces it. The
        // old `best` must feed the second-place select before being
        // replaced.
        let second_candidate = ev.select(engine, beats_second, amount, second)?;
        let second_candidate = keep(ev, engine, second_candidate)?;
        let next_second = ev.select(engine, is_higher, best, second_candidate)?;
        second = keep(ev, engine, next_second)?;

        let next_best = ev.select(engine, is_higher, amount, best)?;
        best = keep(ev, engine, next_best)?;

        let next_index = ev.select(engine, is_higher, index, best_index)?;
        best_index = keep(ev, engine, next_index)?;
    }

    Ok(WinnerValues {
        winner_index: best_index,
        clearing_price: second,
    })
}
