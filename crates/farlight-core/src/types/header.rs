use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError};
use crate::mpt::keccak256;
use crate::types::committee::CommitteeSet;

/// A foreign-chain block header, reduced to what the light client needs:
/// identity (height + hash chain), the roots proofs are checked against,
/// and the extra-data field that may carry a committee announcement.
///
/// Immutable once accepted into the header store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Height on the source chain.
    pub height: u64,
    /// Hash of the parent header.
    pub parent_hash: [u8; 32],
    /// Root of the receipts trie — inclusion proofs are replayed against this.
    pub receipts_root: [u8; 32],
    /// Root of the state trie.
    pub state_root: [u8; 32],
    /// Chain-specific extra data; may carry an RLP-encoded next committee.
    pub extra_data: Vec<u8>,
    /// Block timestamp (seconds).
    pub timestamp: u64,
}

impl BlockHeader {
    /// Identity hash: keccak256 of the RLP encoding.
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&codec::encode_header(self))
    }

    /// Decode a committee announcement from the extra-data field, if present.
    /// Empty extra data means no announcement.
    pub fn next_committee(&self) -> Result<Option<CommitteeSet>, CodecError> {
        codec::decode_committee_extra(&self.extra_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header(height: u64) -> BlockHeader {
        BlockHeader {
            height,
            parent_hash: [1; 32],
            receipts_root: [2; 32],
            state_root: [3; 32],
            extra_data: vec![],
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn hash_is_deterministic_and_height_sensitive() {
        let a = make_header(10);
        let b = make_header(10);
        let c = make_header(11);
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn empty_extra_data_carries_no_committee() {
        let header = make_header(1);
        assert!(header.next_committee().unwrap().is_none());
    }
}
