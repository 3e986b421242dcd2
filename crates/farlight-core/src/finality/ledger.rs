//! Ledger-info quorum finality for PoS source chains: each validator signs
//! the ledger commit root with ed25519; the member's stored public key is
//! the verification key.

use ed25519_dalek::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::finality::FinalityError;
use crate::types::committee::CommitteeMember;

/// The commit root validators sign: the signing root re-bound to the ledger
/// commit context.
pub fn commit_root(signing_root: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"ledger-commit");
    hasher.update(signing_root);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Verify one ed25519 signature per participant, in bitmap order.
pub fn verify_each(
    participants: &[(usize, &CommitteeMember)],
    signing_root: &[u8; 32],
    signatures: &[Vec<u8>],
) -> Result<(), FinalityError> {
    if signatures.len() != participants.len() {
        return Err(FinalityError::SignatureCount {
            signers: participants.len(),
            signatures: signatures.len(),
        });
    }

    let message = commit_root(signing_root);
    for ((index, member), signature) in participants.iter().zip(signatures) {
        let key_bytes: [u8; 32] =
            member
                .public_key
                .as_slice()
                .try_into()
                .map_err(|_| FinalityError::InvalidPublicKey {
                    index: *index,
                    reason: format!("expected 32 bytes, got {}", member.public_key.len()),
                })?;
        let key = VerifyingKey::from_bytes(&key_bytes).map_err(|e| {
            FinalityError::InvalidPublicKey {
                index: *index,
                reason: e.to_string(),
            }
        })?;

        let sig_bytes: [u8; 64] = signature
            .as_slice()
            .try_into()
            .map_err(|_| FinalityError::InvalidSignature { index: *index })?;
        key.verify_strict(&message, &Signature::from_bytes(&sig_bytes))
            .map_err(|_| FinalityError::InvalidSignature { index: *index })?;
    }
    Ok(())
}
