//! Disclosure Gateway
//!
//! The gateway is the only component outside the engine that ever holds
//! the seal key. It receives [`DisclosureRequest`]s produced when an
//! auction closes, decrypts exactly the two exported values (winner index
//! and clearing price), and delivers the plaintexts back to the engine
//! through an asynchronous finalize callback keyed by correlation token.
//!
//! Request lifecycle:
//! 1. `accept` registers the request (Received)
//! 2. `process` decrypts both entries (Decrypted)
//! 3. `deliver` invokes the finalize callback (Delivered, or Failed)

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use veil_seal::{unseal, SealKey};
use veil_types::{CorrelationToken, DisclosureEntry, DisclosureRequest, Plaintext};

/// Errors surfaced to the gateway operator.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Duplicate disclosure request {0}")]
    DuplicateRequest(String),

    #[error("Unknown disclosure request {0}")]
    UnknownRequest(String),

    #[error("Request {token} is {phase:?}, expected {expected:?}")]
    WrongPhase {
        token: String,
        phase: RequestPhase,
        expected: RequestPhase,
    },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Finalize callback rejected: {0}")]
    CallbackRejected(String),
}

/// State of a disclosure request inside the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPhase {
    /// Accepted, ciphertexts not yet opened
    Received,
    /// Both entries decrypted, awaiting delivery
    Decrypted,
    /// Plaintexts delivered to the engine
    Delivered,
    /// Decryption or delivery failed
    Failed(String),
}

/// Decrypted result of a disclosure request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptedOutcome {
    pub winner_index: u32,
    pub clearing_price: u64,
}

/// Callback through which plaintexts flow back to the engine.
///
/// Delivery must be idempotent on the engine side; the gateway retries a
/// `Decrypted` request only if the callback reports failure.
pub trait FinalizeCallback {
    type Error: std::fmt::Display;

    fn finalize(
        &mut self,
        token: CorrelationToken,
        winner_index: u32,
        clearing_price: u64,
    ) -> std::result::Result<(), Self::Error>;
}

#[derive(Debug)]
struct GatewayRequest {
    request: DisclosureRequest,
    phase: RequestPhase,
    outcome: Option<DecryptedOutcome>,
}

/// Gateway holding the seal key and the outstanding disclosure requests.
pub struct DisclosureGateway {
    key: SealKey,
    requests: HashMap<CorrelationToken, GatewayRequest>,
}

impl DisclosureGateway {
    pub fn new(key: SealKey) -> Self {
        Self {
            key,
            requests: HashMap::new(),
        }
    }

    /// Register an incoming disclosure request.
    pub fn accept(&mut self, request: DisclosureRequest) -> std::result::Result<(), GatewayError> {
        let token = request.token;
        if self.requests.contains_key(&token) {
            return Err(GatewayError::DuplicateRequest(hex::encode(token)));
        }

        info!(
            token = hex::encode(token),
            auction_id = request.auction_id,
            "Accepted disclosure request"
        );

        self.requests.insert(
            token,
            GatewayRequest {
                request,
                phase: RequestPhase::Received,
                outcome: None,
            },
        );
        Ok(())
    }

    /// Decrypt both entries of a received request.
    pub fn process(
        &mut self,
        token: CorrelationToken,
    ) -> std::result::Result<DecryptedOutcome, GatewayError> {
        let entry = self
            .requests
            .get_mut(&token)
            .ok_or_else(|| GatewayError::UnknownRequest(hex::encode(token)))?;

        if entry.phase != RequestPhase::Received {
            return Err(GatewayError::WrongPhase {
                token: hex::encode(token),
                phase: entry.phase.clone(),
                expected: RequestPhase::Received,
            });
        }

        let outcome = match decrypt_request(&self.key, &entry.request) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    token = hex::encode(token),
                    error = %e,
                    "Disclosure decryption failed"
                );
                entry.phase = RequestPhase::Failed(e.to_string());
                return Err(GatewayError::DecryptionFailed(e.to_string()));
            }
        };

        debug!(
            token = hex::encode(token),
            winner_index = outcome.winner_index,
            clearing_price = outcome.clearing_price,
            "Disclosure request decrypted"
        );

        entry.phase = RequestPhase::Decrypted;
        entry.outcome = Some(outcome);
        Ok(outcome)
    }

    /// Deliver a decrypted outcome through the finalize callback.
    pub fn deliver<C: FinalizeCallback>(
        &mut self,
        token: CorrelationToken,
        callback: &mut C,
    ) -> std::result::Result<(), GatewayError> {
        let entry = self
            .requests
            .get_mut(&token)
            .ok_or_else(|| GatewayError::UnknownRequest(hex::encode(token)))?;

        let outcome = match (&entry.phase, entry.outcome) {
            (RequestPhase::Decrypted, Some(outcome)) => outcome,
            _ => {
                return Err(GatewayError::WrongPhase {
                    token: hex::encode(token),
                    phase: entry.phase.clone(),
                    expected: RequestPhase::Decrypted,
                })
            }
        };

        match callback.finalize(token, outcome.winner_index, outcome.clearing_price) {
            Ok(()) => {
                info!(
                    token = hex::encode(token),
                    auction_id = entry.request.auction_id,
                    "Disclosure delivered"
                );
                entry.phase = RequestPhase::Delivered;
                Ok(())
            }
            Err(e) => {
                warn!(
                    token = hex::encode(token),
                    error = %e,
                    "Finalize callback rejected delivery"
                );
                entry.phase = RequestPhase::Failed(e.to_string());
                Err(GatewayError::CallbackRejected(e.to_string()))
            }
        }
    }

    /// Run a received request end to end.
    pub fn process_and_deliver<C: FinalizeCallback>(
        &mut self,
        token: CorrelationToken,
        callback: &mut C,
    ) -> std::result::Result<DecryptedOutcome, GatewayError> {
        let outcome = self.process(token)?;
        self.deliver(token, callback)?;
        Ok(outcome)
    }

    pub fn phase(&self, token: &CorrelationToken) -> Option<RequestPhase> {
        self.requests.get(token).map(|entry| entry.phase.clone())
    }

    /// Tokens still awaiting decryption or delivery.
    pub fn pending_tokens(&self) -> Vec<CorrelationToken> {
        self.requests
            .iter()
            .filter(|(_, entry)| {
                matches!(entry.phase, RequestPhase::Received | RequestPhase::Decrypted)
            })
            .map(|(token, _)| *token)
            .collect()
    }

    /// Drop a finished request.
    pub fn remove(&mut self, token: &CorrelationToken) -> bool {
        self.requests.remove(token).is_some()
    }
}

fn decrypt_request(key: &SealKey, request: &DisclosureRequest) -> Result<DecryptedOutcome> {
    let winner = decode_entry(key, &request.winner_index).context("winner index entry")?;
    let price = decode_entry(key, &request.clearing_price).context("clearing price entry")?;

    let winner_index = match winner {
        Plaintext::Uint32(v) => v,
        other => return Err(anyhow!("winner index has type {:?}", other.tag())),
    };
    if !price.tag().is_numeric() {
        return Err(anyhow!("clearing price has type {:?}", price.tag()));
    }

    Ok(DecryptedOutcome {
        winner_index,
        clearing_price: price.as_u64(),
    })
}

fn decode_entry(key: &SealKey, entry: &DisclosureEntry) -> Result<Plaintext> {
    let bytes = unseal(key, &entry.ciphertext)
        .map_err(|e| anyhow!("unseal value {}: {e}", entry.value_id))?;
    Plaintext::from_bytes(entry.tag, &bytes)
        .ok_or_else(|| anyhow!("value {} does not decode as {:?}", entry.value_id, entry.tag))
}
