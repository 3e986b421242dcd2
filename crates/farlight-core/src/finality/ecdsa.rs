//! ECDSA multisig finality: one 65-byte recoverable secp256k1 signature per
//! signer, checked by recovering the signer address from the prehash and
//! matching it against the committee member's account.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::finality::FinalityError;
use crate::mpt::keccak256;
use crate::types::committee::{Address, CommitteeMember};

/// Recover the Ethereum-style address from a 65-byte `r || s || v` signature
/// over `prehash`.
pub fn recover_address(prehash: &[u8; 32], signature_65: &[u8]) -> Option<Address> {
    if signature_65.len() != 65 {
        return None;
    }
    let signature = Signature::from_slice(&signature_65[..64]).ok()?;
    let recovery_id = RecoveryId::from_byte(signature_65[64])?;
    let key = VerifyingKey::recover_from_prehash(prehash, &signature, recovery_id).ok()?;

    // address = keccak256(uncompressed pubkey without the 0x04 tag)[12..]
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    Some(address)
}

/// Verify one signature per participant, in bitmap order.
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

    for ((index, member), signature) in participants.iter().zip(signatures) {
        let recovered = recover_address(signing_root, signature)
            .ok_or(FinalityError::InvalidSignature { index: *index })?;
        if recovered != member.account {
            return Err(FinalityError::InvalidSignature { index: *index });
        }
    }
    Ok(())
}
