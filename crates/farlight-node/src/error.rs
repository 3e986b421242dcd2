use thiserror::Error;

use farlight_core::{CodecError, FinalityError, ProofError, RotationError, StoreError};

use crate::admin::AdminError;
use crate::config::ConfigError;

/// Every failure the external interface can surface. All terminal and
/// synchronous — retries and back-off belong to the relayer, not here.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("light node is already initialized")]
    AlreadyInitialized,

    #[error("light node is not initialized")]
    NotInitialized,

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Finality(#[from] FinalityError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Rotation(#[from] RotationError),
}
