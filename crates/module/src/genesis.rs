//! Genesis configuration for the auction engine.

use serde::{Deserialize, Serialize};

use veil_types::Principal;

/// Initial configuration for the auction engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineGenesisConfig {
    /// Principal the engine itself acts under when operating on values
    pub engine_principal: Principal,

    /// Principal of the external decryption gateway
    pub gateway_principal: Principal,

    /// Seal key material shared with the decryption gateway
    pub seal_key: [u8; 32],

    /// Default auction parameters
    pub default_params: DefaultAuctionParams,
}

/// Default parameters for new auctions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultAuctionParams {
    /// Minimum bidding duration (seconds)
    pub min_bidding_duration: u64,
    /// Minimum window between bidding deadline and reveal deadline
    pub min_reveal_window: u64,
}

impl Default for DefaultAuctionParams {
    fn default() -> Self {
        Self {
            min_bidding_duration: 3600, // 1 hour
            min_reveal_window: 600,     // 10 minutes
        }
    }
}

impl EngineGenesisConfig {
    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.engine_principal == self.gateway_principal {
            return Err(GenesisValidationError::PrincipalOverlap);
        }
        if self.default_params.min_bidding_duration == 0 {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Minimum bidding duration cannot be zero".into(),
            ));
        }
        if self.default_params.min_reveal_window == 0 {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Minimum reveal window cannot be zero".into(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Engine and gateway principals must differ")]
    PrincipalOverlap,

    #[error("Invalid default parameters: {0}")]
    InvalidDefaultParams(String),
}
