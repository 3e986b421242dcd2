use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// A 20-byte account address, as recovered from an ECDSA signature.
pub type Address = [u8; 20];

/// Errors raised by committee validation.
#[derive(Debug, Error)]
pub enum CommitteeError {
    #[error("committee has no members")]
    Empty,

    #[error("total voting power overflows the accumulator")]
    PowerOverflow,

    #[error("quorum voting power {quorum} exceeds total voting power {total}")]
    QuorumTooHigh { quorum: u64, total: u128 },

    #[error("quorum voting power must be non-zero")]
    ZeroQuorum,
}

/// One committee member: the account it signs as, its raw public key
/// (scheme-dependent length: 48 bytes BLS, 33 bytes compressed secp256k1,
/// 32 bytes ed25519), and its voting power.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub account: Address,
    pub public_key: Vec<u8>,
    pub voting_power: u64,
}

/// The signer set authoritative for one epoch. Replaced wholesale at epoch
/// boundaries, never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeSet {
    /// Epoch during which this set is authoritative.
    pub epoch: u64,
    /// Ordered member list; signer bitmaps index into this.
    pub members: Vec<CommitteeMember>,
    /// Minimum signed voting power for a block to be final.
    pub quorum_voting_power: u64,
}

impl CommitteeSet {
    /// Sum of all members' voting power. Checked — a committee whose total
    /// does not fit the accumulator is invalid, so no downstream sum can wrap.
    pub fn total_voting_power(&self) -> Result<u128, CommitteeError> {
        let mut total: u128 = 0;
        for member in &self.members {
            total = total
                .checked_add(u128::from(member.voting_power))
                .ok_or(CommitteeError::PowerOverflow)?;
        }
        Ok(total)
    }

    /// Structural validation: non-empty, non-zero quorum, quorum reachable.
    pub fn validate(&self) -> Result<(), CommitteeError> {
        if self.members.is_empty() {
            return Err(CommitteeError::Empty);
        }
        if self.quorum_voting_power == 0 {
            return Err(CommitteeError::ZeroQuorum);
        }
        let total = self.total_voting_power()?;
        if u128::from(self.quorum_voting_power) > total {
            return Err(CommitteeError::QuorumTooHigh {
                quorum: self.quorum_voting_power,
                total,
            });
        }
        Ok(())
    }

    /// SHA-256 commitment over the full key set. A finality proof names the
    /// committee it was produced by through this hash.
    pub fn keys_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.epoch.to_le_bytes());
        hasher.update(self.quorum_voting_power.to_le_bytes());
        for member in &self.members {
            hasher.update(member.account);
            hasher.update((member.public_key.len() as u64).to_le_bytes());
            hasher.update(&member.public_key);
            hasher.update(member.voting_power.to_le_bytes());
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}
