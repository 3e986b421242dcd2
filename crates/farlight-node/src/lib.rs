//! # Farlight Node
//!
//! The external surface of a Farlight light-client instance: one
//! [`LightNode`] per tracked source chain, wrapping the pure verification
//! logic of `farlight-core` behind a serialized, lock-protected state.
//!
//! A relayer feeds it encoded header batches via
//! [`LightNode::update_block_header`]; applications verify receipt
//! inclusion via [`LightNode::verify_proof_data`]. Configuration changes
//! (admin transfer, signature-scheme swap) go through a two-step admin
//! gate; verification itself is open to any caller.

pub mod admin;
pub mod config;
pub mod error;
pub mod node;

pub use admin::{AdminError, AdminGate};
pub use config::{ConfigError, GenesisConfig};
pub use error::NodeError;
pub use node::LightNode;
