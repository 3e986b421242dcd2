use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::header::BlockHeader;

/// Errors from the header store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("empty header batch")]
    EmptyBatch,

    #[error("non-contiguous header batch: expected height {expected}, got {got}")]
    SequenceError { expected: u64, got: u64 },

    #[error("height overflow while advancing past {at}")]
    HeightOverflow { at: u64 },

    #[error("height {height} is outside the verifiable range [{min}, {max}]")]
    OutOfRange { height: u64, min: u64, max: u64 },
}

/// Append-only, height-indexed ledger of accepted receipts roots with a
/// sliding verifiable window.
///
/// Headers arrive at a fixed `step` between tracked heights: `step == 1`
/// tracks every block, an epoch-synced chain tracks one header per epoch
/// (e.g. every 3600 blocks). A batch must start at `max_height + step` and
/// advance by `step` per header — anything else is a `SequenceError`.
///
/// Finality must already have been verified before a header reaches the
/// store; the store only tracks the height → root mapping and the window.
#[derive(Clone, Debug)]
pub struct HeaderStore {
    step: u64,
    retention: Option<usize>,
    min_height: u64,
    max_height: u64,
    roots: BTreeMap<u64, [u8; 32]>,
}

impl HeaderStore {
    /// Create a store seeded with the genesis header.
    ///
    /// `retention` of `Some(n)` keeps only the newest `n` heights (FIFO by
    /// height); `None` grows unbounded.
    pub fn new(genesis: &BlockHeader, step: u64, retention: Option<usize>) -> Self {
        let step = step.max(1);
        let mut roots = BTreeMap::new();
        roots.insert(genesis.height, genesis.receipts_root);
        Self {
            step,
            retention,
            min_height: genesis.height,
            max_height: genesis.height,
            roots,
        }
    }

    /// Distance between consecutive tracked heights.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Highest accepted height.
    pub fn max_height(&self) -> u64 {
        self.max_height
    }

    /// Oldest height still queryable.
    pub fn min_height(&self) -> u64 {
        self.min_height
    }

    /// The verifiable window `[min, max]`.
    pub fn verifiable_range(&self) -> (u64, u64) {
        (self.min_height, self.max_height)
    }

    /// Whether a root is stored for `height`.
    pub fn contains(&self, height: u64) -> bool {
        self.roots.contains_key(&height)
    }

    /// Append a contiguous batch of already-finalized headers.
    ///
    /// All-or-nothing: the whole batch is validated before any height is
    /// inserted, so a failed append leaves the window untouched.
    /// Returns the new max height.
    pub fn append(&mut self, headers: &[BlockHeader]) -> Result<u64, StoreError> {
        if headers.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let mut expected = self.max_height;
        for header in headers {
            expected = expected
                .checked_add(self.step)
                .ok_or(StoreError::HeightOverflow { at: expected })?;
            if header.height != expected {
                return Err(StoreError::SequenceError {
                    expected,
                    got: header.height,
                });
            }
        }

        for header in headers {
            self.roots.insert(header.height, header.receipts_root);
        }
        self.max_height = expected;
        self.prune();
        Ok(self.max_height)
    }

    /// The stored receipts root at `height`, or `OutOfRange` if the height
    /// is outside the window or not on a tracked step boundary.
    pub fn root_at(&self, height: u64) -> Result<[u8; 32], StoreError> {
        self.roots
            .get(&height)
            .copied()
            .ok_or(StoreError::OutOfRange {
                height,
                min: self.min_height,
                max: self.max_height,
            })
    }

    fn prune(&mut self) {
        let Some(keep) = self.retention else {
            return;
        };
        // Never prune below one entry.
        let keep = keep.max(1);
        while self.roots.len() > keep {
            self.roots.pop_first();
        }
        if let Some((&min, _)) = self.roots.first_key_value() {
            self.min_height = min;
        }
    }
}
