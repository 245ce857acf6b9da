//! Bid creation and sealing.

use rand::{CryptoRng, RngCore};
use thiserror::Error;

use veil_module::AuctionCall;
use veil_seal::{prove_binding, seal, SealKey};
use veil_types::{ImportProof, Plaintext, Principal, SealedCiphertext};

/// Errors that can occur during bid creation.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Bid value exceeds maximum")]
    BidTooLarge,
}

/// A prepared bid ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedBid {
    /// Sealed bid amount
    pub ciphertext: SealedCiphertext,
    /// Proof binding the ciphertext to the bidder
    pub proof: ImportProof,
    /// Original bid value (keep secret)
    pub bid_value: u64,
}

impl PreparedBid {
    /// The submission call for this bid.
    pub fn into_call(self, auction_id: u64) -> AuctionCall {
        AuctionCall::PlaceBid {
            auction_id,
            ciphertext: self.ciphertext,
            proof: self.proof,
        }
    }
}

/// Create a sealed bid bound to the bidder.
///
/// The nonce is drawn fresh from `rng`, so sealing the same amount twice
/// yields unrelated ciphertexts.
pub fn create_bid<R: RngCore + CryptoRng>(
    key: &SealKey,
    bidder: &Principal,
    bid_value: u64,
    rng: &mut R,
) -> Result<PreparedBid, BidError> {
    let amount = u32::try_from(bid_value).map_err(|_| BidError::BidTooLarge)?;

    let mut nonce = [0u8; 16];
    rng.fill_bytes(&mut nonce);

    let ciphertext = seal(key, nonce, &Plaintext::Uint32(amount).to_bytes());
    let proof = prove_binding(bidder, &ciphertext);

    Ok(PreparedBid {
        ciphertext,
        proof,
        bid_value,
    })
}

/// Builder for creating bids with additional options.
pub struct BidBuilder {
    key: SealKey,
    bidder: Principal,
    bid_value: u64,
}

impl BidBuilder {
    pub fn new(key: SealKey, bidder: Principal) -> Self {
        Self {
            key,
            bidder,
            bid_value: 0,
        }
    }

    /// Set the bid value.
    pub fn bid_value(mut self, value: u64) -> Self {
        self.bid_value = value;
        self
    }

    /// Build the prepared bid.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<PreparedBid, BidError> {
        create_bid(&self.key, &self.bidder, self.bid_value, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use veil_seal::{unseal, verify_binding};

    const BIDDER: Principal = [5u8; 32];

    fn key() -> SealKey {
        SealKey::from_bytes([42u8; 32])
    }

    #[test]
    fn test_create_bid_round_trip() {
        let bid = create_bid(&key(), &BIDDER, 250, &mut OsRng).unwrap();

        assert!(verify_binding(&BIDDER, &bid.ciphertext, &bid.proof));
        let bytes = unseal(&key(), &bid.ciphertext).unwrap();
        assert_eq!(
            Plaintext::from_bytes(veil_types::TypeTag::Uint32, &bytes),
            Some(Plaintext::Uint32(250))
        );
    }

    #[test]
    fn test_proof_bound_to_bidder() {
        let bid = create_bid(&key(), &BIDDER, 100, &mut OsRng).unwrap();
        let other: Principal = [6u8; 32];
        assert!(!verify_binding(&other, &bid.ciphertext, &bid.proof));
    }

    #[test]
    fn test_equal_amounts_seal_differently() {
        let first = create_bid(&key(), &BIDDER, 100, &mut OsRng).unwrap();
        let second = create_bid(&key(), &BIDDER, 100, &mut OsRng).unwrap();
        assert_ne!(first.ciphertext.body, second.ciphertext.body);
    }

    #[test]
    fn test_bid_too_large() {
        let result = create_bid(&key(), &BIDDER, u64::from(u32::MAX) + 1, &mut OsRng);
        assert!(matches!(result, Err(BidError::BidTooLarge)));
    }

    #[test]
    fn test_builder() {
        let bid = BidBuilder::new(key(), BIDDER)
            .bid_value(75)
            .build(&mut OsRng)
            .unwrap();
        assert_eq!(bid.bid_value, 75);

        let call = bid.into_call(3);
        assert!(matches!(call, AuctionCall::PlaceBid { auction_id: 3, .. }));
    }
}
