//! Merkle-Patricia-Trie inclusion proof verification.
//!
//! Replays a proof path node by node from the stored receipts root down to
//! the leaf, checking at each step that the node hashes to what its parent
//! committed to. Stateless — the caller supplies the trusted root.

use alloy_rlp::Header;
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Errors during trie proof verification and leaf decoding.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("empty proof: no trie nodes provided")]
    EmptyProof,

    #[error("proof mismatch: node {index} hashes to {computed}, parent commits to {expected}")]
    ProofMismatch {
        index: usize,
        computed: String,
        expected: String,
    },

    #[error("invalid trie node at depth {depth}: {reason}")]
    InvalidNode { depth: usize, reason: String },

    #[error("no leaf at the proven path")]
    LeafMissing,

    #[error("proof path incomplete: trie traversal ended at depth {depth}")]
    IncompleteProof { depth: usize },

    #[error("invalid leaf encoding: {reason}")]
    LeafDecode { reason: String },
}

/// keccak256 of arbitrary data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

struct NodeItem<'a> {
    payload: &'a [u8],
    is_list: bool,
}

/// Split one RLP trie node into its items. Branch nodes have 17 items,
/// extension/leaf nodes have 2.
fn split_node(node: &[u8], depth: usize) -> Result<Vec<NodeItem<'_>>, ProofError> {
    let invalid = |reason: String| ProofError::InvalidNode { depth, reason };

    let mut buf = node;
    let header = Header::decode(&mut buf).map_err(|e| invalid(e.to_string()))?;
    if !header.list {
        return Err(invalid("node is not an RLP list".into()));
    }
    let header_len = node.len() - buf.len();
    if header_len + header.payload_length != node.len() {
        return Err(invalid("trailing bytes after node payload".into()));
    }

    let mut payload = &buf[..header.payload_length];
    let mut items = Vec::new();
    while !payload.is_empty() {
        let mut probe = payload;
        let item = Header::decode(&mut probe).map_err(|e| invalid(e.to_string()))?;
        let item_header_len = payload.len() - probe.len();
        let total = item_header_len + item.payload_length;
        if payload.len() < total {
            return Err(invalid("truncated node item".into()));
        }
        items.push(NodeItem {
            payload: &payload[item_header_len..total],
            is_list: item.list,
        });
        payload = &payload[total..];
    }
    Ok(items)
}

/// Expand a key into its nibble path (4 bits each, high nibble first).
fn to_nibbles(key: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(key.len() * 2);
    for byte in key {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    nibbles
}

/// Decode the hex-prefix (compact) path of an extension or leaf node.
/// Returns (nibbles, is_leaf).
fn decode_compact(encoded: &[u8]) -> (Vec<u8>, bool) {
    if encoded.is_empty() {
        return (vec![], false);
    }

    let flag = encoded[0] >> 4;
    let is_leaf = flag >= 2;
    let is_odd = flag % 2 == 1;

    let mut nibbles = Vec::new();
    if is_odd {
        nibbles.push(encoded[0] & 0x0F);
    }
    for &byte in &encoded[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    (nibbles, is_leaf)
}

/// Verify an inclusion proof for `key` against `expected_root`.
///
/// Returns the leaf value bytes. Absence of the key (proof of
/// non-existence) is `LeafMissing` — a relay has no use for it.
pub fn verify_inclusion(
    expected_root: &[u8; 32],
    key: &[u8],
    proof_nodes: &[Vec<u8>],
) -> Result<Vec<u8>, ProofError> {
    if proof_nodes.is_empty() {
        return Err(ProofError::EmptyProof);
    }

    let nibbles = to_nibbles(key);
    let mut at = 0usize;
    let mut want = *expected_root;

    for (depth, node) in proof_nodes.iter().enumerate() {
        let computed = keccak256(node);
        // Nodes shorter than 32 bytes are embedded in their parent, not
        // hashed. The root node has no parent: it is always committed to by
        // hash, whatever its size.
        if (depth == 0 || node.len() >= 32) && computed != want {
            return Err(ProofError::ProofMismatch {
                index: depth,
                computed: hex::encode(computed),
                expected: hex::encode(want),
            });
        }

        let items = split_node(node, depth)?;
        match items.len() {
            17 => {
                if at >= nibbles.len() {
                    // Key fully consumed: value lives in the branch value slot.
                    let value = &items[16];
                    if value.payload.is_empty() {
                        return Err(ProofError::LeafMissing);
                    }
                    return Ok(value.payload.to_vec());
                }

                let child = &items[nibbles[at] as usize];
                at += 1;

                if depth + 1 < proof_nodes.len() {
                    if child.is_list || child.payload.len() != 32 {
                        return Err(ProofError::InvalidNode {
                            depth,
                            reason: format!(
                                "expected 32-byte child reference, got {} bytes",
                                child.payload.len()
                            ),
                        });
                    }
                    want.copy_from_slice(child.payload);
                } else {
                    // Last proof node: the child slot holds the value inline.
                    if child.payload.is_empty() {
                        return Err(ProofError::LeafMissing);
                    }
                    return Ok(child.payload.to_vec());
                }
            }
            2 => {
                let (prefix, is_leaf) = decode_compact(items[0].payload);

                if is_leaf {
                    if nibbles[at..] != prefix[..] {
                        return Err(ProofError::LeafMissing);
                    }
                    if items[1].payload.is_empty() {
                        return Err(ProofError::LeafMissing);
                    }
                    return Ok(items[1].payload.to_vec());
                }

                // Extension: consume the shared prefix, follow the child ref.
                if !nibbles[at..].starts_with(&prefix) {
                    return Err(ProofError::LeafMissing);
                }
                at += prefix.len();

                if depth + 1 >= proof_nodes.len() {
                    return Err(ProofError::IncompleteProof {
                        depth: proof_nodes.len(),
                    });
                }
                if items[1].is_list || items[1].payload.len() != 32 {
                    return Err(ProofError::InvalidNode {
                        depth,
                        reason: "extension child is not a 32-byte reference".into(),
                    });
                }
                want.copy_from_slice(items[1].payload);
            }
            n => {
                return Err(ProofError::InvalidNode {
                    depth,
                    reason: format!("{n}-element node, expected 2 or 17"),
                });
            }
        }
    }

    Err(ProofError::IncompleteProof {
        depth: proof_nodes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Encodable;
    use hex_literal::hex;

    fn rlp_bytes(out: &mut Vec<u8>, data: &[u8]) {
        <[u8] as Encodable>::encode(data, out);
    }

    fn rlp_list(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        Header {
            list: true,
            payload_length: payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(payload);
        out
    }

    /// Hex-prefix encode a nibble path.
    fn compact(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
        let mut flag = if is_leaf { 2u8 } else { 0 };
        let mut out = Vec::new();
        if nibbles.len() % 2 == 1 {
            flag += 1;
            out.push((flag << 4) | nibbles[0]);
            for pair in nibbles[1..].chunks(2) {
                out.push((pair[0] << 4) | pair[1]);
            }
        } else {
            out.push(flag << 4);
            for pair in nibbles.chunks(2) {
                out.push((pair[0] << 4) | pair[1]);
            }
        }
        out
    }

    fn leaf_node(path: &[u8], value: &[u8]) -> Vec<u8> {
        let mut payload = Vec::new();
        rlp_bytes(&mut payload, &compact(path, true));
        rlp_bytes(&mut payload, value);
        rlp_list(&payload)
    }

    /// Branch node with a single 32-byte child reference at `index`.
    fn branch_node(index: usize, child_hash: &[u8; 32]) -> Vec<u8> {
        let mut payload = Vec::new();
        for i in 0..16 {
            if i == index {
                rlp_bytes(&mut payload, child_hash);
            } else {
                rlp_bytes(&mut payload, &[]);
            }
        }
        rlp_bytes(&mut payload, &[]); // empty value slot
        rlp_list(&payload)
    }

    #[test]
    fn keccak256_matches_known_vector() {
        assert_eq!(
            keccak256(b""),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn single_leaf_proof_verifies() {
        let key = [0x01u8];
        let value = vec![0xEE; 40];
        let node = leaf_node(&to_nibbles(&key), &value);
        let root = keccak256(&node);

        let leaf = verify_inclusion(&root, &key, &[node]).unwrap();
        assert_eq!(leaf, value);
    }

    #[test]
    fn branch_then_leaf_proof_verifies() {
        let key = [0x01u8]; // nibbles [0, 1]
        let value = vec![0xEE; 40];
        let leaf = leaf_node(&[0x1], &value);
        let branch = branch_node(0, &keccak256(&leaf));
        let root = keccak256(&branch);

        let got = verify_inclusion(&root, &key, &[branch, leaf]).unwrap();
        assert_eq!(got, value);
    }

    #[test]
    fn short_root_node_is_still_hash_checked() {
        // A leaf node under 32 bytes would dodge the embedded-node exemption
        // if the root were exempt; it must still hash to the expected root.
        let key = [0x01u8];
        let node = leaf_node(&to_nibbles(&key), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(node.len() < 32);

        let err = verify_inclusion(&[0x77; 32], &key, &[node.clone()]).unwrap_err();
        assert!(matches!(err, ProofError::ProofMismatch { index: 0, .. }));

        // Against its own hash the same short node verifies.
        let leaf = verify_inclusion(&keccak256(&node), &key, &[node]).unwrap();
        assert_eq!(leaf, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn wrong_root_is_proof_mismatch() {
        let key = [0x01u8];
        let node = leaf_node(&to_nibbles(&key), &[0xEE; 40]);
        let err = verify_inclusion(&[0xAB; 32], &key, &[node]).unwrap_err();
        assert!(matches!(err, ProofError::ProofMismatch { index: 0, .. }));
    }

    #[test]
    fn tampered_intermediate_node_is_detected() {
        let key = [0x01u8];
        let value = vec![0xEE; 40];
        let leaf = leaf_node(&[0x1], &value);
        let branch = branch_node(0, &keccak256(&leaf));
        let root = keccak256(&branch);

        let other_leaf = leaf_node(&[0x1], &vec![0xDD; 40]);
        let err = verify_inclusion(&root, &key, &[branch, other_leaf]).unwrap_err();
        assert!(matches!(err, ProofError::ProofMismatch { index: 1, .. }));
    }

    #[test]
    fn diverging_leaf_path_is_missing() {
        let key = [0x01u8];
        let node = leaf_node(&[0x2, 0x3], &[0xEE; 40]);
        let root = keccak256(&node);
        let err = verify_inclusion(&root, &key, &[node]).unwrap_err();
        assert!(matches!(err, ProofError::LeafMissing));
    }

    #[test]
    fn empty_proof_is_rejected() {
        let err = verify_inclusion(&[0; 32], &[0x01], &[]).unwrap_err();
        assert!(matches!(err, ProofError::EmptyProof));
    }

    #[test]
    fn non_list_node_is_invalid() {
        let mut node = Vec::new();
        rlp_bytes(&mut node, &[0xAA; 40]);
        let root = keccak256(&node);
        let err = verify_inclusion(&root, &[0x01], &[node]).unwrap_err();
        assert!(matches!(err, ProofError::InvalidNode { depth: 0, .. }));
    }

    #[test]
    fn compact_round_trip() {
        for (nibbles, is_leaf) in [
            (vec![0x1u8], true),
            (vec![0x1, 0x2], true),
            (vec![0xA, 0xB, 0xC], false),
            (vec![0xA, 0xB], false),
        ] {
            let (decoded, leaf) = decode_compact(&compact(&nibbles, is_leaf));
            assert_eq!(decoded, nibbles);
            assert_eq!(leaf, is_leaf);
        }
    }
}
