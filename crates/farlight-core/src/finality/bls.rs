//! BLS12-381 aggregate finality: one signature covers every signer named by
//! the bitmap; the verifier aggregates the participants' public keys and
//! checks the single pairing.

use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
use blst::BLST_ERROR;

use crate::finality::FinalityError;
use crate::types::committee::CommitteeMember;

/// Domain separation tag for BLS signatures (hash-to-curve, proof of possession).
const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Verify the aggregate signature of `participants` over `signing_root`.
/// Expects exactly one signature: the aggregate.
pub fn verify_aggregate(
    participants: &[(usize, &CommitteeMember)],
    signing_root: &[u8; 32],
    signatures: &[Vec<u8>],
) -> Result<(), FinalityError> {
    if signatures.len() != 1 {
        return Err(FinalityError::SignatureCount {
            signers: participants.len(),
            signatures: signatures.len(),
        });
    }

    let signature = Signature::from_bytes(&signatures[0])
        .map_err(|e| FinalityError::Bls(format!("malformed aggregate signature: {e:?}")))?;

    let mut keys = Vec::with_capacity(participants.len());
    for (index, member) in participants {
        let key = PublicKey::from_bytes(&member.public_key).map_err(|e| {
            FinalityError::InvalidPublicKey {
                index: *index,
                reason: format!("{e:?}"),
            }
        })?;
        keys.push(key);
    }

    let key_refs: Vec<&PublicKey> = keys.iter().collect();
    let aggregate = AggregatePublicKey::aggregate(&key_refs, false)
        .map_err(|e| FinalityError::Bls(format!("key aggregation failed: {e:?}")))?;

    // The signature arrives from the wire and gets a subgroup check; the
    // keys are committee-sourced and do not need one.
    let result = signature.verify(
        true,
        signing_root,
        DST,
        &[],
        &aggregate.to_public_key(),
        false,
    );
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(FinalityError::InvalidSignature { index: 0 });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blst::min_pk::{AggregateSignature, SecretKey};

    fn keypair(seed: u8) -> (SecretKey, Vec<u8>) {
        let ikm = [seed; 32];
        let sk = SecretKey::key_gen(&ikm, &[]).unwrap();
        let pk = sk.sk_to_pk().to_bytes().to_vec();
        (sk, pk)
    }

    fn member(index: u8, public_key: Vec<u8>) -> CommitteeMember {
        CommitteeMember {
            account: [index; 20],
            public_key,
            voting_power: 1,
        }
    }

    fn aggregate_over(sks: &[&SecretKey], message: &[u8; 32]) -> Vec<u8> {
        let sigs: Vec<_> = sks.iter().map(|sk| sk.sign(message, DST, &[])).collect();
        let sig_refs: Vec<_> = sigs.iter().collect();
        AggregateSignature::aggregate(&sig_refs, false)
            .unwrap()
            .to_signature()
            .to_bytes()
            .to_vec()
    }

    #[test]
    fn valid_aggregate_verifies() {
        let (sk1, pk1) = keypair(1);
        let (sk2, pk2) = keypair(2);
        let root = [0x55u8; 32];
        let agg = aggregate_over(&[&sk1, &sk2], &root);

        let m1 = member(1, pk1);
        let m2 = member(2, pk2);
        let participants = vec![(0usize, &m1), (1usize, &m2)];
        verify_aggregate(&participants, &root, &[agg]).unwrap();
    }

    #[test]
    fn wrong_message_is_rejected() {
        let (sk1, pk1) = keypair(1);
        let agg = aggregate_over(&[&sk1], &[0x55u8; 32]);

        let m1 = member(1, pk1);
        let participants = vec![(0usize, &m1)];
        let err = verify_aggregate(&participants, &[0x66u8; 32], &[agg]).unwrap_err();
        assert!(matches!(err, FinalityError::InvalidSignature { .. }));
    }

    #[test]
    fn missing_participant_key_is_rejected() {
        // Signed by two keys, but the verifier only aggregates one.
        let (sk1, pk1) = keypair(1);
        let (sk2, _) = keypair(2);
        let root = [0x55u8; 32];
        let agg = aggregate_over(&[&sk1, &sk2], &root);

        let m1 = member(1, pk1);
        let participants = vec![(0usize, &m1)];
        let err = verify_aggregate(&participants, &root, &[agg]).unwrap_err();
        assert!(matches!(err, FinalityError::InvalidSignature { .. }));
    }

    #[test]
    fn corrupted_aggregate_is_rejected() {
        let (sk1, pk1) = keypair(1);
        let root = [0x55u8; 32];
        let mut agg = aggregate_over(&[&sk1], &root);
        agg[1] ^= 0x01;

        let m1 = member(1, pk1);
        let participants = vec![(0usize, &m1)];
        assert!(verify_aggregate(&participants, &root, &[agg]).is_err());
    }

    #[test]
    fn rejects_multiple_signatures() {
        let (_, pk1) = keypair(1);
        let m1 = member(1, pk1);
        let participants = vec![(0usize, &m1)];
        let err =
            verify_aggregate(&participants, &[0u8; 32], &[vec![0u8; 96], vec![0u8; 96]])
                .unwrap_err();
        assert!(matches!(err, FinalityError::SignatureCount { .. }));
    }

    #[test]
    fn malformed_public_key_is_reported_with_index() {
        let root = [0x55u8; 32];
        let (sk1, _) = keypair(1);
        let agg = aggregate_over(&[&sk1], &root);

        let bad = member(9, vec![0u8; 48]);
        let participants = vec![(3usize, &bad)];
        let err = verify_aggregate(&participants, &root, &[agg]).unwrap_err();
        assert!(matches!(err, FinalityError::InvalidPublicKey { index: 3, .. }));
    }
}
