use serde::{Deserialize, Serialize};

use crate::receipt::TransactionReceipt;

/// A block's finality evidence: which committee members signed, and their
/// signatures. Validated once per header batch, then discarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityProof {
    /// Epoch of the committee that produced the proof.
    pub epoch: u64,
    /// Consensus round the signatures were collected in.
    pub round: u64,
    /// Signer bitmap, one bit per committee member (LSB-first per byte).
    pub signers: Vec<u8>,
    /// One aggregate signature (BLS) or one signature per set bit
    /// (ECDSA / ledger-info), in bitmap order.
    pub signatures: Vec<Vec<u8>>,
    /// Commitment to the key set of the signing committee.
    pub committee_keys_hash: [u8; 32],
}

impl FinalityProof {
    /// Number of set bits in the signer bitmap.
    pub fn num_signers(&self) -> usize {
        self.signers.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Whether the member at `index` signed.
    pub fn has_signer(&self, index: usize) -> bool {
        let byte = index / 8;
        let bit = index % 8;
        self.signers
            .get(byte)
            .is_some_and(|b| (b >> bit) & 1 == 1)
    }

    /// Indices of all signing members, ascending.
    pub fn signer_indices(&self, member_count: usize) -> Vec<usize> {
        (0..member_count).filter(|&i| self.has_signer(i)).collect()
    }
}

/// A Merkle-Patricia-Trie inclusion proof for a receipt at a past height.
/// Stateless input; never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InclusionProof {
    /// Height whose stored receipts root the proof is replayed against.
    pub height: u64,
    /// Trie key — the RLP-encoded transaction index for the receipts trie.
    pub key: Vec<u8>,
    /// Proof path, root node first.
    pub proof_nodes: Vec<Vec<u8>>,
}

/// Output of a successful inclusion verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedReceipt {
    /// Height the proof was checked at.
    pub height: u64,
    /// Trie key that was proven.
    pub key: Vec<u8>,
    /// Raw leaf bytes as committed in the trie.
    pub raw: Vec<u8>,
    /// The decoded receipt.
    pub receipt: TransactionReceipt,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof_with_bits(bits: Vec<u8>) -> FinalityProof {
        FinalityProof {
            epoch: 1,
            round: 0,
            signers: bits,
            signatures: vec![],
            committee_keys_hash: [0; 32],
        }
    }

    #[test]
    fn counts_signers() {
        let proof = proof_with_bits(vec![0b1111_1111, 0b0000_0001]);
        assert_eq!(proof.num_signers(), 9);
        assert!(proof.has_signer(0));
        assert!(proof.has_signer(8));
        assert!(!proof.has_signer(9));
    }

    #[test]
    fn signer_indices_respect_member_count() {
        let proof = proof_with_bits(vec![0b0000_0101]);
        assert_eq!(proof.signer_indices(8), vec![0, 2]);
        // Bits past the member count are ignored by the index view.
        assert_eq!(proof.signer_indices(1), vec![0]);
    }

    #[test]
    fn out_of_bitmap_indices_are_unset() {
        let proof = proof_with_bits(vec![0xFF]);
        assert!(!proof.has_signer(8));
        assert!(!proof.has_signer(100));
    }
}
