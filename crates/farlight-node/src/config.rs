use farlight_core::{Address, BlockHeader, CommitteeError, CommitteeSet, FinalityScheme};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors while loading or validating a genesis configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid genesis JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid genesis committee: {0}")]
    Committee(#[from] CommitteeError),

    #[error("height step must be non-zero")]
    ZeroStep,

    #[error("retention of zero would make the window empty")]
    ZeroRetention,
}

/// One-time setup for a light-client instance: the trusted checkpoint header,
/// the genesis committee, and the window/scheme parameters.
///
/// The checkpoint is the one moment of trust — it must be cross-checked
/// against independent sources before a node is initialized with it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Address allowed to perform gated configuration changes.
    pub admin: Address,
    /// Signature scheme of the source chain's finality proofs.
    pub scheme: FinalityScheme,
    /// Distance between consecutive tracked heights (1 = every block).
    pub step: u64,
    /// Number of newest heights to retain; `None` grows unbounded.
    pub retention: Option<usize>,
    /// The committee authoritative at the checkpoint.
    pub committee: CommitteeSet,
    /// The trusted checkpoint header.
    pub initial_header: BlockHeader,
}

impl GenesisConfig {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if self.retention == Some(0) {
            return Err(ConfigError::ZeroRetention);
        }
        self.committee.validate()?;
        Ok(())
    }
}
