//! RLP wire codec for everything that crosses the verifier boundary:
//! header batches with their inline finality proof, inclusion proofs, and
//! committee announcements carried in header extra data.
//!
//! The byte layout is deliberately simple — every structure is an RLP list
//! of its fields in declaration order. A chain-specific codec can replace
//! this module without touching the verifier.

use alloy_rlp::{Encodable, Header};
use thiserror::Error;

use crate::types::committee::{CommitteeMember, CommitteeSet};
use crate::types::header::BlockHeader;
use crate::types::proof::{FinalityProof, InclusionProof};

/// Errors while decoding wire input. Encoding cannot fail.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid RLP: {0}")]
    Rlp(String),

    #[error("expected an RLP byte string, found a list")]
    ExpectedBytes,

    #[error("expected an RLP list, found a byte string")]
    ExpectedList,

    #[error("RLP item extends past the end of input")]
    Truncated,

    #[error("integer field too large: {got} bytes")]
    IntTooLarge { got: usize },

    #[error("non-canonical integer encoding with a leading zero byte")]
    LeadingZeroInt,

    #[error("fixed-length field has wrong length: expected {expected} bytes, got {got}")]
    BadLength { expected: usize, got: usize },

    #[error("unexpected trailing bytes after {0}")]
    Trailing(&'static str),
}

// --- Writer helpers ---

fn put_u64(out: &mut Vec<u8>, value: u64) {
    value.encode(out);
}

fn put_bytes(out: &mut Vec<u8>, data: &[u8]) {
    <[u8] as Encodable>::encode(data, out);
}

/// Wrap an already-encoded payload in a list header.
fn put_list(out: &mut Vec<u8>, payload: &[u8]) {
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(out);
    out.extend_from_slice(payload);
}

// --- Reader ---

/// Sequential reader over an RLP payload.
pub(crate) struct RlpCursor<'a> {
    buf: &'a [u8],
}

impl<'a> RlpCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Decode the next item's header without consuming it.
    /// Returns the header and its encoded length in bytes.
    fn peek_header(&self) -> Result<(Header, usize), CodecError> {
        let mut probe = self.buf;
        let header = Header::decode(&mut probe).map_err(|e| CodecError::Rlp(e.to_string()))?;
        Ok((header, self.buf.len() - probe.len()))
    }

    fn take_payload(&mut self, want_list: bool) -> Result<&'a [u8], CodecError> {
        let (header, header_len) = self.peek_header()?;
        if header.list != want_list {
            return Err(if want_list {
                CodecError::ExpectedList
            } else {
                CodecError::ExpectedBytes
            });
        }
        let total = header_len + header.payload_length;
        if self.buf.len() < total {
            return Err(CodecError::Truncated);
        }
        let payload = &self.buf[header_len..total];
        self.buf = &self.buf[total..];
        Ok(payload)
    }

    pub(crate) fn take_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        self.take_payload(false)
    }

    pub(crate) fn take_list(&mut self) -> Result<RlpCursor<'a>, CodecError> {
        self.take_payload(true).map(RlpCursor::new)
    }

    pub(crate) fn take_u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.take_bytes()?;
        if bytes.len() > 8 {
            return Err(CodecError::IntTooLarge { got: bytes.len() });
        }
        // Canonical RLP integers carry no leading zeros (zero itself is the
        // empty string), keeping the encoding injective.
        if bytes.first() == Some(&0) {
            return Err(CodecError::LeadingZeroInt);
        }
        let mut value: u64 = 0;
        for &b in bytes {
            value = (value << 8) | u64::from(b);
        }
        Ok(value)
    }

    pub(crate) fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.take_bytes()?;
        if bytes.len() != N {
            return Err(CodecError::BadLength {
                expected: N,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn finish(self, context: &'static str) -> Result<(), CodecError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Trailing(context))
        }
    }
}

// --- Block headers ---

fn put_header(out: &mut Vec<u8>, header: &BlockHeader) {
    let mut payload = Vec::new();
    put_u64(&mut payload, header.height);
    put_bytes(&mut payload, &header.parent_hash);
    put_bytes(&mut payload, &header.receipts_root);
    put_bytes(&mut payload, &header.state_root);
    put_bytes(&mut payload, &header.extra_data);
    put_u64(&mut payload, header.timestamp);
    put_list(out, &payload);
}

/// Encode a single header. Also the preimage of `BlockHeader::hash`.
pub fn encode_header(header: &BlockHeader) -> Vec<u8> {
    let mut out = Vec::new();
    put_header(&mut out, header);
    out
}

fn take_header_item(cursor: &mut RlpCursor<'_>) -> Result<BlockHeader, CodecError> {
    let mut fields = cursor.take_list()?;
    let header = BlockHeader {
        height: fields.take_u64()?,
        parent_hash: fields.take_array()?,
        receipts_root: fields.take_array()?,
        state_root: fields.take_array()?,
        extra_data: fields.take_bytes()?.to_vec(),
        timestamp: fields.take_u64()?,
    };
    fields.finish("block header")?;
    Ok(header)
}

/// Decode a single header from its full encoding.
pub fn decode_header(data: &[u8]) -> Result<BlockHeader, CodecError> {
    let mut cursor = RlpCursor::new(data);
    let header = take_header_item(&mut cursor)?;
    cursor.finish("block header")?;
    Ok(header)
}

// --- Finality proofs ---

fn put_finality_proof(out: &mut Vec<u8>, proof: &FinalityProof) {
    let mut payload = Vec::new();
    put_u64(&mut payload, proof.epoch);
    put_u64(&mut payload, proof.round);
    put_bytes(&mut payload, &proof.signers);
    let mut sigs = Vec::new();
    for sig in &proof.signatures {
        put_bytes(&mut sigs, sig);
    }
    put_list(&mut payload, &sigs);
    put_bytes(&mut payload, &proof.committee_keys_hash);
    put_list(out, &payload);
}

fn take_finality_proof(cursor: &mut RlpCursor<'_>) -> Result<FinalityProof, CodecError> {
    let mut fields = cursor.take_list()?;
    let epoch = fields.take_u64()?;
    let round = fields.take_u64()?;
    let signers = fields.take_bytes()?.to_vec();
    let mut sig_items = fields.take_list()?;
    let mut signatures = Vec::new();
    while !sig_items.is_empty() {
        signatures.push(sig_items.take_bytes()?.to_vec());
    }
    let committee_keys_hash = fields.take_array()?;
    fields.finish("finality proof")?;
    Ok(FinalityProof {
        epoch,
        round,
        signers,
        signatures,
        committee_keys_hash,
    })
}

// --- Header batches ---

/// Encode a header batch with its inline finality proof.
pub fn encode_header_batch(headers: &[BlockHeader], proof: &FinalityProof) -> Vec<u8> {
    let mut header_items = Vec::new();
    for header in headers {
        put_header(&mut header_items, header);
    }
    let mut payload = Vec::new();
    put_list(&mut payload, &header_items);
    put_finality_proof(&mut payload, proof);
    let mut out = Vec::new();
    put_list(&mut out, &payload);
    out
}

/// Decode a header batch. The heights and roots of the decoded sequence are
/// exactly those that were encoded — the store re-validates contiguity.
pub fn decode_header_batch(data: &[u8]) -> Result<(Vec<BlockHeader>, FinalityProof), CodecError> {
    let mut cursor = RlpCursor::new(data);
    let mut batch = cursor.take_list()?;
    cursor.finish("header batch")?;

    let mut header_items = batch.take_list()?;
    let mut headers = Vec::new();
    while !header_items.is_empty() {
        headers.push(take_header_item(&mut header_items)?);
    }
    let proof = take_finality_proof(&mut batch)?;
    batch.finish("header batch")?;
    Ok((headers, proof))
}

// --- Committees ---

fn put_committee(out: &mut Vec<u8>, committee: &CommitteeSet) {
    let mut members = Vec::new();
    for member in &committee.members {
        let mut fields = Vec::new();
        put_bytes(&mut fields, &member.account);
        put_bytes(&mut fields, &member.public_key);
        put_u64(&mut fields, member.voting_power);
        put_list(&mut members, &fields);
    }
    let mut payload = Vec::new();
    put_u64(&mut payload, committee.epoch);
    put_u64(&mut payload, committee.quorum_voting_power);
    put_list(&mut payload, &members);
    put_list(out, &payload);
}

/// Encode a committee set, e.g. for embedding in header extra data.
pub fn encode_committee(committee: &CommitteeSet) -> Vec<u8> {
    let mut out = Vec::new();
    put_committee(&mut out, committee);
    out
}

/// Decode a committee set.
pub fn decode_committee(data: &[u8]) -> Result<CommitteeSet, CodecError> {
    let mut cursor = RlpCursor::new(data);
    let mut fields = cursor.take_list()?;
    cursor.finish("committee")?;

    let epoch = fields.take_u64()?;
    let quorum_voting_power = fields.take_u64()?;
    let mut member_items = fields.take_list()?;
    let mut members = Vec::new();
    while !member_items.is_empty() {
        let mut member = member_items.take_list()?;
        members.push(CommitteeMember {
            account: member.take_array()?,
            public_key: member.take_bytes()?.to_vec(),
            voting_power: member.take_u64()?,
        });
        member.finish("committee member")?;
    }
    fields.finish("committee")?;
    Ok(CommitteeSet {
        epoch,
        members,
        quorum_voting_power,
    })
}

/// Decode an optional committee announcement from header extra data.
/// Empty extra data means no announcement.
pub fn decode_committee_extra(extra: &[u8]) -> Result<Option<CommitteeSet>, CodecError> {
    if extra.is_empty() {
        return Ok(None);
    }
    decode_committee(extra).map(Some)
}

// --- Inclusion proofs ---

/// Encode an inclusion proof.
pub fn encode_inclusion_proof(proof: &InclusionProof) -> Vec<u8> {
    let mut nodes = Vec::new();
    for node in &proof.proof_nodes {
        put_bytes(&mut nodes, node);
    }
    let mut payload = Vec::new();
    put_u64(&mut payload, proof.height);
    put_bytes(&mut payload, &proof.key);
    put_list(&mut payload, &nodes);
    let mut out = Vec::new();
    put_list(&mut out, &payload);
    out
}

/// Decode an inclusion proof.
pub fn decode_inclusion_proof(data: &[u8]) -> Result<InclusionProof, CodecError> {
    let mut cursor = RlpCursor::new(data);
    let mut fields = cursor.take_list()?;
    cursor.finish("inclusion proof")?;

    let height = fields.take_u64()?;
    let key = fields.take_bytes()?.to_vec();
    let mut node_items = fields.take_list()?;
    let mut proof_nodes = Vec::new();
    while !node_items.is_empty() {
        proof_nodes.push(node_items.take_bytes()?.to_vec());
    }
    fields.finish("inclusion proof")?;
    Ok(InclusionProof {
        height,
        key,
        proof_nodes,
    })
}
