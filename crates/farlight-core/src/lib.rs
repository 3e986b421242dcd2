//! # Farlight Core
//!
//! Pure Rust light-client verification logic for a foreign header chain.
//!
//! This crate contains **no I/O and no locking** — it is the verification
//! heart of Farlight. Every header and every inclusion proof passes through
//! these functions before anything downstream trusts it.
//!
//! ## Trust model
//!
//! - **Committee finality** (`finality` module): a block is final once
//!   signers holding at least the committee's quorum voting power have
//!   signed it. Signature schemes (BLS aggregate, ECDSA multisig, ledger-info
//!   quorum) are a closed set selected per source chain.
//!
//! - **Inclusion proofs** (`mpt` module): Merkle-Patricia trie proofs
//!   replayed against a receipts root that was accepted under committee
//!   finality. No trust assumptions beyond that root.
//!
//! - **Committee rotation** (`rotation` module): the current committee signs
//!   over its successor; the successor is trusted only after it produces a
//!   valid finality proof of its own.

pub mod codec;
pub mod finality;
pub mod mpt;
pub mod receipt;
pub mod rotation;
pub mod store;
pub mod types;

// Re-export commonly used items for convenience
pub use codec::{
    decode_header_batch, decode_inclusion_proof, encode_committee, encode_header_batch,
    encode_inclusion_proof, CodecError,
};
pub use finality::{
    compute_signing_root, verify_finality, verify_parent_links, FinalityError, FinalityScheme,
};
pub use mpt::{keccak256, verify_inclusion, ProofError};
pub use receipt::{decode_receipt, Log, TransactionReceipt};
pub use rotation::{EpochManager, EpochState, RotationError};
pub use store::{HeaderStore, StoreError};
pub use types::{
    committee::{Address, CommitteeError, CommitteeMember, CommitteeSet},
    header::BlockHeader,
    proof::{FinalityProof, InclusionProof, VerifiedReceipt},
};
