//! Decoding of the proven leaf into a transaction receipt.
//!
//! Receipts may be typed (EIP-2718 style, a single type byte before the RLP
//! payload) or legacy. Either way the payload is a 4-item list: status,
//! cumulative gas used, logs bloom, logs.

use crate::codec::RlpCursor;
use crate::mpt::ProofError;

/// An event log emitted by a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    pub address: [u8; 20],
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
}

/// A decoded transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// 1 for success, 0 for failure.
    pub status: u8,
    /// Gas used by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Bloom filter over the log addresses and topics.
    pub logs_bloom: Box<[u8; 256]>,
    /// Emitted event logs.
    pub logs: Vec<Log>,
}

fn leaf_decode(reason: impl ToString) -> ProofError {
    ProofError::LeafDecode {
        reason: reason.to_string(),
    }
}

/// Decode a receipt from the raw leaf bytes proven in the receipts trie.
pub fn decode_receipt(data: &[u8]) -> Result<TransactionReceipt, ProofError> {
    if data.is_empty() {
        return Err(leaf_decode("empty leaf"));
    }

    // Typed receipt: a leading type byte below 0x80 precedes the RLP payload.
    let payload = if data[0] <= 0x7F { &data[1..] } else { data };

    let mut cursor = RlpCursor::new(payload);
    let mut fields = cursor.take_list().map_err(leaf_decode)?;
    cursor.finish("receipt").map_err(leaf_decode)?;

    let status_bytes = fields.take_bytes().map_err(leaf_decode)?;
    let status = status_bytes.first().copied().unwrap_or(0);

    let cumulative_gas_used = fields.take_u64().map_err(leaf_decode)?;

    let bloom_bytes = fields.take_bytes().map_err(leaf_decode)?;
    if bloom_bytes.len() != 256 {
        return Err(leaf_decode(format!(
            "logs bloom is {} bytes, expected 256",
            bloom_bytes.len()
        )));
    }
    let mut logs_bloom = Box::new([0u8; 256]);
    logs_bloom.copy_from_slice(bloom_bytes);

    let mut log_items = fields.take_list().map_err(leaf_decode)?;
    let mut logs = Vec::new();
    while !log_items.is_empty() {
        logs.push(decode_log(&mut log_items)?);
    }
    fields.finish("receipt").map_err(leaf_decode)?;

    Ok(TransactionReceipt {
        status,
        cumulative_gas_used,
        logs_bloom,
        logs,
    })
}

fn decode_log(items: &mut RlpCursor<'_>) -> Result<Log, ProofError> {
    let mut fields = items.take_list().map_err(leaf_decode)?;
    let address = fields.take_array().map_err(leaf_decode)?;

    let mut topic_items = fields.take_list().map_err(leaf_decode)?;
    let mut topics = Vec::new();
    while !topic_items.is_empty() {
        topics.push(topic_items.take_array().map_err(leaf_decode)?);
    }

    let data = fields.take_bytes().map_err(leaf_decode)?.to_vec();
    fields.finish("log").map_err(leaf_decode)?;
    Ok(Log {
        address,
        topics,
        data,
    })
}
