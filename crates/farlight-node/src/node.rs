use std::collections::BTreeSet;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use farlight_core::{
    codec, mpt, receipt, verify_finality, verify_parent_links, Address, EpochManager, EpochState,
    FinalityError, FinalityScheme, HeaderStore, VerifiedReceipt,
};

use crate::admin::AdminGate;
use crate::config::GenesisConfig;
use crate::error::NodeError;

/// Everything one light-client instance owns. Mutated only under the
/// instance's writer lock, so every external call is atomic relative to
/// all others — the same serial execution model the design was lifted from.
struct VerifierState {
    store: HeaderStore,
    epochs: EpochManager,
    scheme: FinalityScheme,
    /// Heights whose receipts root has been proven against at least once.
    verified_roots: BTreeSet<u64>,
    admin: AdminGate,
}

/// A light-client instance tracking one foreign chain.
///
/// Header appends, cache updates and admin changes take the write lock;
/// status queries and stateless proof verification take the read lock and
/// never block each other.
pub struct LightNode {
    inner: RwLock<Option<VerifierState>>,
}

impl Default for LightNode {
    fn default() -> Self {
        Self::new()
    }
}

impl LightNode {
    /// Create an uninitialized instance. Every operation except
    /// [`initialize`](Self::initialize) fails until the genesis is applied.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// One-time setup from a genesis configuration. A second call fails
    /// with `AlreadyInitialized` and leaves the existing state untouched.
    pub fn initialize(&self, genesis: GenesisConfig) -> Result<(), NodeError> {
        genesis.validate()?;
        let mut inner = self.inner.write();
        if inner.is_some() {
            return Err(NodeError::AlreadyInitialized);
        }

        info!(
            height = genesis.initial_header.height,
            epoch = genesis.committee.epoch,
            scheme = ?genesis.scheme,
            "initializing light node"
        );
        *inner = Some(VerifierState {
            store: HeaderStore::new(&genesis.initial_header, genesis.step, genesis.retention),
            epochs: EpochManager::new(genesis.committee),
            scheme: genesis.scheme,
            verified_roots: BTreeSet::new(),
            admin: AdminGate::new(genesis.admin),
        });
        Ok(())
    }

    /// Accept an encoded header batch with its inline finality proof.
    ///
    /// The proof is checked against the committee authoritative for its
    /// claimed epoch — the active set, or the pending set while a rotation
    /// is in flight. The proof covers the last header; every earlier header
    /// must link to its successor by parent hash, so the signed head commits
    /// to the whole batch. A batch verified by the pending committee
    /// confirms the rotation. All-or-nothing: on any failure the window is
    /// unchanged.
    ///
    /// Open to any caller. Returns the new tracked height.
    pub fn update_block_header(&self, batch: &[u8]) -> Result<u64, NodeError> {
        let (headers, proof) = codec::decode_header_batch(batch)?;

        let mut inner = self.inner.write();
        let state = inner.as_mut().ok_or(NodeError::NotInitialized)?;

        let Some(last) = headers.last() else {
            return Err(farlight_core::StoreError::EmptyBatch.into());
        };
        verify_parent_links(&headers)?;

        let committee =
            state
                .epochs
                .committee_for(proof.epoch)
                .ok_or(FinalityError::EpochMismatch {
                    got: proof.epoch,
                    expected: state.epochs.active().epoch,
                })?;
        verify_finality(last, &proof, committee, state.scheme)?;

        let pending_epoch = state.epochs.pending().map(|p| p.epoch);
        let new_height = state.store.append(&headers)?;

        if pending_epoch == Some(proof.epoch) {
            state.epochs.confirm(proof.epoch)?;
            info!(epoch = proof.epoch, "committee rotation confirmed");
        } else if let Some(pending) = pending_epoch {
            // No rollback by design: flag the stall, keep waiting.
            warn!(
                pending_epoch = pending,
                "committee rotation still pending"
            );
        }

        for header in &headers {
            // Extra data that does not decode as a committee is chain-specific
            // payload, not an announcement. The batch is already committed at
            // this point, so nothing here may fail the call.
            let next = match header.next_committee() {
                Ok(next) => next,
                Err(e) => {
                    debug!(height = header.height, error = %e, "opaque extra data");
                    None
                }
            };
            let Some(next) = next else {
                continue;
            };
            let next_epoch = next.epoch;
            match state.epochs.begin_rotation(next) {
                Ok(()) => {
                    info!(
                        height = header.height,
                        next_epoch, "committee rotation announced"
                    );
                }
                Err(e) => {
                    // The batch itself is already accepted; a bad or
                    // duplicate announcement only fails to start a rotation.
                    warn!(
                        height = header.height,
                        next_epoch,
                        error = %e,
                        "ignoring committee announcement"
                    );
                }
            }
        }

        info!(height = new_height, "header batch accepted");
        Ok(new_height)
    }

    /// Verify an encoded inclusion proof against the stored root at its
    /// target height. Stateless — repeated calls with the same input return
    /// the same result.
    ///
    /// Open to any caller.
    pub fn verify_proof_data(&self, proof: &[u8]) -> Result<VerifiedReceipt, NodeError> {
        let inner = self.inner.read();
        let state = inner.as_ref().ok_or(NodeError::NotInitialized)?;
        Self::verify_against_store(state, proof)
    }

    /// As [`verify_proof_data`](Self::verify_proof_data), but records the
    /// target height in the verified-roots cache on success. Returns the
    /// receipt and whether the root was already cached.
    ///
    /// Cache entries are never invalidated: headers are immutable once
    /// accepted, so a proven root stays proven.
    pub fn verify_proof_data_with_cache(
        &self,
        proof: &[u8],
    ) -> Result<(VerifiedReceipt, bool), NodeError> {
        let mut inner = self.inner.write();
        let state = inner.as_mut().ok_or(NodeError::NotInitialized)?;

        let verified = Self::verify_against_store(state, proof)?;
        let was_cached = !state.verified_roots.insert(verified.height);
        if !was_cached {
            debug!(height = verified.height, "receipts root cached");
        }
        Ok((verified, was_cached))
    }

    /// Whether the receipts root at `height` has been proven against before.
    pub fn is_cached_receipt_root(&self, height: u64) -> bool {
        self.inner
            .read()
            .as_ref()
            .is_some_and(|state| state.verified_roots.contains(&height))
    }

    fn verify_against_store(
        state: &VerifierState,
        proof: &[u8],
    ) -> Result<VerifiedReceipt, NodeError> {
        let proof = codec::decode_inclusion_proof(proof)?;
        let root = state.store.root_at(proof.height)?;
        let raw = mpt::verify_inclusion(&root, &proof.key, &proof.proof_nodes)?;
        let decoded = receipt::decode_receipt(&raw)?;
        Ok(VerifiedReceipt {
            height: proof.height,
            key: proof.key,
            raw,
            receipt: decoded,
        })
    }

    /// Highest accepted height.
    pub fn header_height(&self) -> Result<u64, NodeError> {
        let inner = self.inner.read();
        let state = inner.as_ref().ok_or(NodeError::NotInitialized)?;
        Ok(state.store.max_height())
    }

    /// The verifiable window `[min, max]`.
    pub fn verifiable_header_range(&self) -> Result<(u64, u64), NodeError> {
        let inner = self.inner.read();
        let state = inner.as_ref().ok_or(NodeError::NotInitialized)?;
        Ok(state.store.verifiable_range())
    }

    /// Rotation state, for operators watching for stalled rotations.
    pub fn epoch_state(&self) -> Result<EpochState, NodeError> {
        let inner = self.inner.read();
        let state = inner.as_ref().ok_or(NodeError::NotInitialized)?;
        Ok(state.epochs.state())
    }

    /// Current admin address.
    pub fn admin(&self) -> Result<Address, NodeError> {
        let inner = self.inner.read();
        let state = inner.as_ref().ok_or(NodeError::NotInitialized)?;
        Ok(state.admin.admin())
    }

    /// Nominate a new admin (admin-gated, step one of two).
    pub fn set_pending_admin(&self, caller: Address, new_admin: Address) -> Result<(), NodeError> {
        let mut inner = self.inner.write();
        let state = inner.as_mut().ok_or(NodeError::NotInitialized)?;
        state.admin.set_pending(caller, new_admin)?;
        info!(new_admin = %hex::encode(new_admin), "pending admin set");
        Ok(())
    }

    /// Accept a pending admin transfer (step two of two).
    pub fn accept_admin(&self, caller: Address) -> Result<(), NodeError> {
        let mut inner = self.inner.write();
        let state = inner.as_mut().ok_or(NodeError::NotInitialized)?;
        state.admin.accept(caller)?;
        info!(admin = %hex::encode(caller), "admin transfer accepted");
        Ok(())
    }

    /// Swap the finality signature scheme (admin-gated). The analogue of
    /// swapping a sub-verifier implementation.
    pub fn set_finality_scheme(
        &self,
        caller: Address,
        scheme: FinalityScheme,
    ) -> Result<(), NodeError> {
        let mut inner = self.inner.write();
        let state = inner.as_mut().ok_or(NodeError::NotInitialized)?;
        state.admin.ensure(caller)?;
        info!(old = ?state.scheme, new = ?scheme, "finality scheme replaced");
        state.scheme = scheme;
        Ok(())
    }
}
