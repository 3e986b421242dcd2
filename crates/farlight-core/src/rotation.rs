//! Epoch/committee rotation.
//!
//! Two states: `Stable` while one committee is authoritative, `Rotating`
//! once an accepted header has announced the next committee. The pending
//! committee is promoted only after it produces a valid finality proof of
//! its own. There is no rollback: if the pending committee never proves
//! liveness the manager stays `Rotating` until an operator intervenes.

use thiserror::Error;

use crate::types::committee::{CommitteeError, CommitteeSet};

/// Errors from rotation transitions.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("rotation to epoch {pending} already pending")]
    RotationPending { pending: u64 },

    #[error("announced committee is for epoch {got}, expected {expected}")]
    EpochSkew { got: u64, expected: u64 },

    #[error("no rotation pending for epoch {epoch}")]
    NotRotating { epoch: u64 },

    #[error("announced committee is invalid: {0}")]
    Committee(#[from] CommitteeError),
}

/// Observable rotation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpochState {
    Stable { epoch: u64 },
    Rotating { epoch: u64, pending_epoch: u64 },
}

/// Holds the active committee and, during rotation windows, the pending one.
#[derive(Clone, Debug)]
pub struct EpochManager {
    active: CommitteeSet,
    pending: Option<CommitteeSet>,
}

impl EpochManager {
    pub fn new(genesis: CommitteeSet) -> Self {
        Self {
            active: genesis,
            pending: None,
        }
    }

    pub fn state(&self) -> EpochState {
        match &self.pending {
            None => EpochState::Stable {
                epoch: self.active.epoch,
            },
            Some(pending) => EpochState::Rotating {
                epoch: self.active.epoch,
                pending_epoch: pending.epoch,
            },
        }
    }

    pub fn active(&self) -> &CommitteeSet {
        &self.active
    }

    pub fn pending(&self) -> Option<&CommitteeSet> {
        self.pending.as_ref()
    }

    /// The committee authoritative for `epoch`: the active set, or the
    /// pending set while a rotation is in flight.
    pub fn committee_for(&self, epoch: u64) -> Option<&CommitteeSet> {
        if epoch == self.active.epoch {
            return Some(&self.active);
        }
        self.pending.as_ref().filter(|p| p.epoch == epoch)
    }

    /// `Stable -> Rotating`: an accepted header announced the next committee.
    /// The announcement must target exactly the next epoch.
    pub fn begin_rotation(&mut self, next: CommitteeSet) -> Result<(), RotationError> {
        if let Some(pending) = &self.pending {
            return Err(RotationError::RotationPending {
                pending: pending.epoch,
            });
        }
        let expected = self.active.epoch + 1;
        if next.epoch != expected {
            return Err(RotationError::EpochSkew {
                got: next.epoch,
                expected,
            });
        }
        next.validate()?;
        self.pending = Some(next);
        Ok(())
    }

    /// `Rotating -> Stable(epoch+1)`: the pending committee proved liveness
    /// by producing a valid finality proof for `epoch`.
    pub fn confirm(&mut self, epoch: u64) -> Result<(), RotationError> {
        match self.pending.take() {
            Some(pending) if pending.epoch == epoch => {
                self.active = pending;
                Ok(())
            }
            other => {
                // Put back whatever we popped; the state is unchanged.
                self.pending = other;
                Err(RotationError::NotRotating { epoch })
            }
        }
    }
}
