//! Signature/consensus verification: checks a header batch's finality proof
//! against the authoritative committee.
//!
//! The quorum contract is uniform across chains — sum the voting power of
//! the signers named by the bitmap and require it to reach the committee's
//! quorum. How an individual signature is checked is scheme-specific and
//! selected by [`FinalityScheme`]: a closed set of variants rather than
//! open-ended plugins.

pub mod bls;
pub mod ecdsa;
pub mod ledger;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::committee::{CommitteeError, CommitteeMember, CommitteeSet};
use crate::types::header::BlockHeader;
use crate::types::proof::FinalityProof;

/// Domain tag mixed into every signing root, preventing cross-context replay.
pub const DOMAIN_FINALITY: [u8; 4] = [0x46, 0x4c, 0x01, 0x00];

/// Errors from finality verification.
#[derive(Debug, Error)]
pub enum FinalityError {
    #[error("quorum not reached: signed voting power {signed} is below required {required}")]
    QuorumNotReached { signed: u128, required: u128 },

    #[error("committee key-set hash mismatch: proof carries {got}, committee is {expected}")]
    KeyHashError { got: String, expected: String },

    #[error("proof claims epoch {got} but committee is authoritative for epoch {expected}")]
    EpochMismatch { got: u64, expected: u64 },

    #[error("header {height} does not link to its predecessor by parent hash")]
    ParentHashMismatch { height: u64 },

    #[error("signer bitmap is {got} bytes, expected {expected} for {members} members")]
    SignerBitmapLength {
        expected: usize,
        got: usize,
        members: usize,
    },

    #[error("{signers} signers set in bitmap but {signatures} signatures supplied")]
    SignatureCount { signers: usize, signatures: usize },

    #[error("invalid signature from committee member {index}")]
    InvalidSignature { index: usize },

    #[error("invalid public key for committee member {index}: {reason}")]
    InvalidPublicKey { index: usize, reason: String },

    #[error("invalid committee: {0}")]
    Committee(#[from] CommitteeError),

    #[error("BLS verification error: {0}")]
    Bls(String),
}

/// Which signature scheme the source chain's finality proofs use.
/// Swappable only through the admin gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalityScheme {
    /// BLS12-381 aggregate signature over the signing root.
    Bls,
    /// Per-signer secp256k1 recover-and-match against member accounts.
    Ecdsa,
    /// Per-signer ed25519 over the ledger commit root (PoS ledger-info).
    LedgerInfo,
}

/// Compute the signing domain for an (epoch, round) pair.
/// domain = DOMAIN_FINALITY + sha256(epoch || round)[..28]
pub fn compute_domain(epoch: u64, round: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(epoch.to_le_bytes());
    hasher.update(round.to_le_bytes());
    let mix = hasher.finalize();

    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(&DOMAIN_FINALITY);
    domain[4..].copy_from_slice(&mix[..28]);
    domain
}

/// What committee members actually sign: the header hash wrapped in the
/// epoch/round domain.
pub fn compute_signing_root(header: &BlockHeader, epoch: u64, round: u64) -> [u8; 32] {
    let domain = compute_domain(epoch, round);
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(&header.hash());
    data[32..].copy_from_slice(&domain);

    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Check that every header in a batch links to its predecessor by parent
/// hash. A finality proof covers only the last header of a batch; the hash
/// chain is what extends that commitment to the earlier ones, so a batch
/// with a broken link must never reach the store.
pub fn verify_parent_links(headers: &[BlockHeader]) -> Result<(), FinalityError> {
    for pair in headers.windows(2) {
        if pair[1].parent_hash != pair[0].hash() {
            return Err(FinalityError::ParentHashMismatch {
                height: pair[1].height,
            });
        }
    }
    Ok(())
}

/// Verify a header's finality proof against a committee.
///
/// Quorum is checked before any cryptography: a proof whose signed voting
/// power is below quorum always fails with `QuorumNotReached`, regardless
/// of whether its individual signatures would verify.
pub fn verify_finality(
    header: &BlockHeader,
    proof: &FinalityProof,
    committee: &CommitteeSet,
    scheme: FinalityScheme,
) -> Result<(), FinalityError> {
    committee.validate()?;

    let expected_hash = committee.keys_hash();
    if proof.committee_keys_hash != expected_hash {
        return Err(FinalityError::KeyHashError {
            got: hex::encode(proof.committee_keys_hash),
            expected: hex::encode(expected_hash),
        });
    }

    if proof.epoch != committee.epoch {
        return Err(FinalityError::EpochMismatch {
            got: proof.epoch,
            expected: committee.epoch,
        });
    }

    let member_count = committee.members.len();
    let expected_len = member_count.div_ceil(8);
    if proof.signers.len() != expected_len {
        return Err(FinalityError::SignerBitmapLength {
            expected: expected_len,
            got: proof.signers.len(),
            members: member_count,
        });
    }

    let participants: Vec<(usize, &CommitteeMember)> = proof
        .signer_indices(member_count)
        .into_iter()
        .map(|i| (i, &committee.members[i]))
        .collect();

    // Voting power sums stay in u128; committee validation already proved
    // the full total fits, so a subset cannot overflow.
    let signed: u128 = participants
        .iter()
        .map(|(_, m)| u128::from(m.voting_power))
        .sum();
    let required = u128::from(committee.quorum_voting_power);
    if signed < required {
        return Err(FinalityError::QuorumNotReached { signed, required });
    }

    let signing_root = compute_signing_root(header, proof.epoch, proof.round);
    match scheme {
        FinalityScheme::Bls => {
            bls::verify_aggregate(&participants, &signing_root, &proof.signatures)
        }
        FinalityScheme::Ecdsa => {
            ecdsa::verify_each(&participants, &signing_root, &proof.signatures)
        }
        FinalityScheme::LedgerInfo => {
            ledger::verify_each(&participants, &signing_root, &proof.signatures)
        }
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
            timestamp: height,
        }
    }

    fn make_committee() -> CommitteeSet {
        CommitteeSet {
            epoch: 4,
            members: (0..4)
                .map(|i| CommitteeMember {
                    account: [i as u8; 20],
                    public_key: vec![i as u8; 33],
                    voting_power: 10,
                })
                .collect(),
            quorum_voting_power: 30,
        }
    }

    fn make_proof(committee: &CommitteeSet, signers: u8) -> FinalityProof {
        FinalityProof {
            epoch: committee.epoch,
            round: 1,
            signers: vec![signers],
            signatures: vec![vec![0u8; 65]; (signers.count_ones()) as usize],
            committee_keys_hash: committee.keys_hash(),
        }
    }

    #[test]
    fn chained_headers_pass_parent_link_check() {
        let mut headers = vec![make_header(5), make_header(6), make_header(7)];
        for i in 1..headers.len() {
            let parent = headers[i - 1].hash();
            headers[i].parent_hash = parent;
        }
        verify_parent_links(&headers).unwrap();
        // Degenerate cases have nothing to link.
        verify_parent_links(&headers[..1]).unwrap();
        verify_parent_links(&[]).unwrap();
    }

    #[test]
    fn broken_parent_link_is_rejected() {
        let mut headers = vec![make_header(5), make_header(6)];
        let parent = headers[0].hash();
        headers[1].parent_hash = parent;
        headers[1].parent_hash[0] ^= 0xFF;
        let err = verify_parent_links(&headers).unwrap_err();
        assert!(matches!(
            err,
            FinalityError::ParentHashMismatch { height: 6 }
        ));
    }

    #[test]
    fn domain_is_epoch_and_round_sensitive() {
        assert_eq!(compute_domain(1, 0), compute_domain(1, 0));
        assert_ne!(compute_domain(1, 0), compute_domain(2, 0));
        assert_ne!(compute_domain(1, 0), compute_domain(1, 1));
        assert_eq!(&compute_domain(1, 0)[..4], &DOMAIN_FINALITY);
    }

    #[test]
    fn below_quorum_fails_before_signature_checks() {
        let committee = make_committee();
        // Two of four signers = 20 power < 30 quorum. Signatures are garbage,
        // but the error must still be QuorumNotReached.
        let proof = make_proof(&committee, 0b0011);
        let err = verify_finality(&make_header(5), &proof, &committee, FinalityScheme::Ecdsa)
            .unwrap_err();
        assert!(matches!(
            err,
            FinalityError::QuorumNotReached {
                signed: 20,
                required: 30
            }
        ));
    }

    #[test]
    fn tampered_keys_hash_fails() {
        let committee = make_committee();
        let mut proof = make_proof(&committee, 0b0111);
        proof.committee_keys_hash[0] ^= 0xFF;
        let err = verify_finality(&make_header(5), &proof, &committee, FinalityScheme::Ecdsa)
            .unwrap_err();
        assert!(matches!(err, FinalityError::KeyHashError { .. }));
    }

    #[test]
    fn epoch_mismatch_fails() {
        let committee = make_committee();
        let mut proof = make_proof(&committee, 0b0111);
        proof.epoch = committee.epoch + 1;
        let err = verify_finality(&make_header(5), &proof, &committee, FinalityScheme::Ecdsa)
            .unwrap_err();
        assert!(matches!(err, FinalityError::EpochMismatch { got: 5, expected: 4 }));
    }

    #[test]
    fn wrong_bitmap_length_fails() {
        let committee = make_committee();
        let mut proof = make_proof(&committee, 0b0111);
        proof.signers = vec![0b0111, 0x00];
        let err = verify_finality(&make_header(5), &proof, &committee, FinalityScheme::Ecdsa)
            .unwrap_err();
        assert!(matches!(err, FinalityError::SignerBitmapLength { .. }));
    }

    #[test]
    fn empty_signer_set_is_below_quorum() {
        let committee = make_committee();
        let proof = make_proof(&committee, 0);
        let err = verify_finality(&make_header(5), &proof, &committee, FinalityScheme::Ecdsa)
            .unwrap_err();
        assert!(matches!(
            err,
            FinalityError::QuorumNotReached { signed: 0, .. }
        ));
    }
}
