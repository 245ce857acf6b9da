//! Core type definitions for the confidential auction engine.
//!
//! This crate provides the shared data structures used across the system:
//! opaque value handles, capability grants, auction records, and the
//! disclosure request types exchanged with the decryption gateway.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// =========================
// PRINCIPALS & IDENTIFIERS
// =========================

/// Authenticated caller identity supplied by the host environment (32 bytes).
pub type Principal = [u8; 32];

/// Correlation token binding a disclosure request to its callback.
pub type CorrelationToken = [u8; 32];

// =========================
// OPAQUE VALUES
// =========================

/// Type discriminant carried by every opaque value.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub enum TypeTag {
    Bool,
    Uint32,
    Uint64,
}

impl TypeTag {
    /// Whether this tag denotes a numeric width.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Uint32 | TypeTag::Uint64)
    }
}

/// A plaintext scalar on its way into or out of the sealed domain.
///
/// This is the only plaintext representation that crosses the seal boundary;
/// everything in between is a [`SealedCiphertext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Plaintext {
    Bool(bool),
    Uint32(u32),
    Uint64(u64),
}

impl Plaintext {
    pub fn tag(&self) -> TypeTag {
        match self {
            Plaintext::Bool(_) => TypeTag::Bool,
            Plaintext::Uint32(_) => TypeTag::Uint32,
            Plaintext::Uint64(_) => TypeTag::Uint64,
        }
    }

    /// Widen to u64 for backend arithmetic.
    pub fn as_u64(&self) -> u64 {
        match self {
            Plaintext::Bool(b) => *b as u64,
            Plaintext::Uint32(v) => *v as u64,
            Plaintext::Uint64(v) => *v,
        }
    }

    /// Fixed-width little-endian encoding for sealing.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Plaintext::Bool(b) => vec![*b as u8],
            Plaintext::Uint32(v) => v.to_le_bytes().to_vec(),
            Plaintext::Uint64(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// Decode a sealed payload back into a scalar of the given tag.
    pub fn from_bytes(tag: TypeTag, bytes: &[u8]) -> Option<Self> {
        match tag {
            TypeTag::Bool => match bytes {
                [0] => Some(Plaintext::Bool(false)),
                [1] => Some(Plaintext::Bool(true)),
                _ => None,
            },
            TypeTag::Uint32 => {
                let arr: [u8; 4] = bytes.try_into().ok()?;
                Some(Plaintext::Uint32(u32::from_le_bytes(arr)))
            }
            TypeTag::Uint64 => {
                let arr: [u8; 8] = bytes.try_into().ok()?;
                Some(Plaintext::Uint64(u64::from_le_bytes(arr)))
            }
        }
    }
}

/// Immutable metadata for an encrypted value handle.
///
/// Opaque values are never mutated in place; a semantic "update" always
/// produces a fresh record with a new id.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct OpaqueValue {
    pub id: u64,
    pub tag: TypeTag,
    pub creator: Principal,
}

/// Sealed payload: masked bytes plus the authentication envelope.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SealedCiphertext {
    /// Keystream-masked plaintext encoding
    pub body: Vec<u8>,
    /// Per-ciphertext nonce
    pub nonce: [u8; 16],
    /// Authentication tag over key, nonce, and body
    pub tag: [u8; 32],
}

/// Proof that an externally supplied ciphertext is bound to its submitter.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ImportProof {
    pub binding: [u8; 32],
}

// =========================
// CAPABILITIES
// =========================

/// Kind of right attached to a (value, principal) pair.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub enum CapabilityKind {
    /// May pass the value as an operand to oracle operations.
    Use,
    /// May request the value's plaintext through the disclosure protocol.
    Disclose,
}

/// Lifetime of a capability grant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum CapabilityScope {
    Persistent,
    /// Valid only while the registry's current transaction equals `tx`.
    TransactionScoped { tx: u64 },
}

// =========================
// AUCTIONS
// =========================

/// Pricing rule for an auction.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionKind {
    /// Winner pays their own bid.
    FirstPrice,
    /// Winner pays the second-highest bid (Vickrey).
    SecondPrice,
}

/// Auction lifecycle phase.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionPhase {
    /// Created, no bids yet
    Created,
    /// Accepting bids
    Bidding,
    /// Winner determined, awaiting the disclosure callback
    Evaluating,
    /// Winner and clearing price public (terminal)
    Revealed,
    /// Cancelled by the seller or expired (terminal)
    Cancelled,
}

/// Full auction record.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub auction_id: u64,
    pub seller: Principal,
    pub kind: AuctionKind,
    pub phase: AuctionPhase,

    /// Human-readable description of the item on offer
    pub item: String,

    // Timing
    pub created_at: u64,
    pub bidding_deadline: u64,
    pub reveal_deadline: u64,

    /// Optional principal granted post-hoc review rights on bid amounts.
    /// Never the seller, never another bidder.
    pub auditor: Option<Principal>,

    // Set on Revealed, and only then
    pub winner: Option<Principal>,
    pub clearing_price: Option<u64>,

    /// Correlation token of the outstanding disclosure request, if any
    pub disclosure_token: Option<CorrelationToken>,
}

impl AuctionRecord {
    /// Whether the auction is still accepting bids (deadline aside).
    pub fn accepts_bids(&self) -> bool {
        matches!(self.phase, AuctionPhase::Created | AuctionPhase::Bidding)
    }

    /// Whether the auction has reached a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, AuctionPhase::Revealed | AuctionPhase::Cancelled)
    }
}

/// A submitted bid. The amount itself lives in the opaque value store;
/// only the handle id is recorded here.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidRecord {
    pub auction_id: u64,
    pub bidder: Principal,
    /// Opaque value id of the encrypted amount (Uint32)
    pub amount_value: u64,
    pub submitted_at: u64,
}

// =========================
// DISCLOSURE PROTOCOL
// =========================

/// One value offered for disclosure: its handle id, type, and ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct DisclosureEntry {
    pub value_id: u64,
    pub tag: TypeTag,
    pub ciphertext: SealedCiphertext,
}

/// Handoff to the external decryption service.
///
/// Carries exactly the two derived values an auction ever discloses: the
/// encrypted winner index and the encrypted clearing price.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct DisclosureRequest {
    pub token: CorrelationToken,
    pub auction_id: u64,
    pub winner_index: DisclosureEntry,
    pub clearing_price: DisclosureEntry,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute the correlation token for an auction's disclosure request.
pub fn compute_correlation_token(
    auction_id: u64,
    winner_value_id: u64,
    price_value_id: u64,
) -> CorrelationToken {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"VEIL_DISCLOSURE_V1:");
    hasher.update(auction_id.to_le_bytes());
    hasher.update(winner_value_id.to_le_bytes());
    hasher.update(price_value_id.to_le_bytes());
    hasher.finalize().into()
}

/// Compute SHA-256 hash.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_token_uniqueness() {
        let t1 = compute_correlation_token(1, 10, 11);
        let t2 = compute_correlation_token(1, 10, 12);
        let t3 = compute_correlation_token(2, 10, 11);

        assert_ne!(t1, t2);
        assert_ne!(t1, t3);
        assert_ne!(t2, t3);
    }

    #[test]
    fn test_plaintext_round_trip() {
        for pt in [
            Plaintext::Bool(true),
            Plaintext::Bool(false),
            Plaintext::Uint32(0),
            Plaintext::Uint32(u32::MAX),
            Plaintext::Uint64(u64::MAX),
        ] {
            let bytes = pt.to_bytes();
            assert_eq!(Plaintext::from_bytes(pt.tag(), &bytes), Some(pt));
        }
    }

    #[test]
    fn test_plaintext_rejects_wrong_width() {
        assert_eq!(Plaintext::from_bytes(TypeTag::Uint32, &[1, 2, 3]), None);
        assert_eq!(Plaintext::from_bytes(TypeTag::Bool, &[2]), None);
    }

    #[test]
    fn test_auction_record_serialization() {
        let record = AuctionRecord {
            auction_id: 1,
            seller: [1u8; 32],
            kind: AuctionKind::SecondPrice,
            phase: AuctionPhase::Bidding,
            item: "one lot".to_string(),
            created_at: 100,
            bidding_deadline: 200,
            reveal_deadline: 300,
            auditor: None,
            winner: None,
            clearing_price: None,
            disclosure_token: None,
        };
        let encoded = borsh::to_vec(&record).unwrap();
        let decoded: AuctionRecord = borsh::from_slice(&encoded).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn test_phase_predicates() {
        let mut record = AuctionRecord {
            auction_id: 1,
            seller: [0u8; 32],
            kind: AuctionKind::FirstPrice,
            phase: AuctionPhase::Created,
            item: String::new(),
            created_at: 0,
            bidding_deadline: 10,
            reveal_deadline: 20,
            auditor: None,
            winner: None,
            clearing_price: None,
            disclosure_token: None,
        };
        assert!(record.accepts_bids());
        assert!(!record.is_terminal());

        record.phase = AuctionPhase::Revealed;
        assert!(!record.accepts_bids());
        assert!(record.is_terminal());
    }
}
