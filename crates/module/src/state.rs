//! Engine state structures.

use std::collections::{HashMap, HashSet};

use veil_oracle::Evaluator;
use veil_seal::SealKey;
use veil_types::{AuctionRecord, BidRecord, CorrelationToken, Principal};

use crate::genesis::{DefaultAuctionParams, EngineGenesisConfig, GenesisValidationError};

/// A disclosure request awaiting its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDisclosure {
    pub auction_id: u64,
    /// Opaque value id of the encrypted winner index
    pub winner_value: u64,
    /// Opaque value id of the encrypted clearing price
    pub price_value: u64,
    pub requested_at: u64,
}

/// Auction engine state.
///
/// Owns the evaluation context; every keyed map is reached only through the
/// handlers, never as an ambient global.
pub struct EngineState {
    pub params: DefaultAuctionParams,
    pub engine_principal: Principal,
    pub gateway_principal: Principal,

    /// Confidential evaluation context (registry + store + oracle)
    pub evaluator: Evaluator,

    /// Next auction ID to assign
    pub next_auction_id: u64,

    /// All auctions by ID
    pub auctions: HashMap<u64, AuctionRecord>,

    /// Bids per auction, in submission order. The winner fold is defined
    /// over this order, so results are deterministic.
    pub bids: HashMap<u64, Vec<BidRecord>>,

    /// Outstanding disclosure requests by correlation token
    pub pending_disclosures: HashMap<CorrelationToken, PendingDisclosure>,

    /// Tokens already consumed by a successful finalize
    pub completed_tokens: HashSet<CorrelationToken>,
}

impl EngineState {
    /// Create engine state from a validated genesis configuration.
    pub fn new(config: EngineGenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;
        Ok(Self {
            params: config.default_params,
            engine_principal: config.engine_principal,
            gateway_principal: config.gateway_principal,
            evaluator: Evaluator::new(SealKey::from_bytes(config.seal_key)),
            next_auction_id: 1,
            auctions: HashMap::new(),
            bids: HashMap::new(),
            pending_disclosures: HashMap::new(),
            completed_tokens: HashSet::new(),
        })
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&mut self) -> u64 {
        let id = self.next_auction_id;
        self.next_auction_id += 1;
        id
    }

    pub fn get_auction(&self, auction_id: u64) -> Option<&AuctionRecord> {
        self.auctions.get(&auction_id)
    }

    pub fn get_auction_mut(&mut self, auction_id: u64) -> Option<&mut AuctionRecord> {
        self.auctions.get_mut(&auction_id)
    }

    /// Bids for an auction in submission order.
    pub fn auction_bids(&self, auction_id: u64) -> &[BidRecord] {
        self.bids
            .get(&auction_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a principal has already bid in an auction.
    pub fn has_bid(&self, auction_id: u64, bidder: &Principal) -> bool {
        self.auction_bids(auction_id)
            .iter()
            .any(|bid| bid.bidder == *bidder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> EngineState {
        EngineState::new(EngineGenesisConfig {
            engine_principal: [0xEE; 32],
            gateway_principal: [0xDD; 32],
            seal_key: [42u8; 32],
            default_params: DefaultAuctionParams::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_allocate_auction_id() {
        let mut state = test_state();
        assert_eq!(state.allocate_auction_id(), 1);
        assert_eq!(state.allocate_auction_id(), 2);
        assert_eq!(state.allocate_auction_id(), 3);
    }

    #[test]
    fn test_invalid_genesis_rejected() {
        let config = EngineGenesisConfig {
            engine_principal: [0xEE; 32],
            gateway_principal: [0xEE; 32],
            seal_key: [42u8; 32],
            default_params: DefaultAuctionParams::default(),
        };
        assert!(EngineState::new(config).is_err());
    }

    #[test]
    fn test_bids_default_empty() {
        let state = test_state();
        assert!(state.auction_bids(1).is_empty());
        assert!(!state.has_bid(1, &[1u8; 32]));
    }
}
