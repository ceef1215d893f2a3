//! Memoization of materialized operators within a single evaluation pass.

use rustc_hash::FxHashMap as HashMap;
use tracing::trace;
use crate::{
    algebra::Matrix,
    operator::{ Operator, OperatorKey },
};

/// Maps the structural key of an operator to its dense matrix.
///
/// A `SimCache` has no eviction policy; it is meant to live exactly as long as
/// one evaluation call.
#[derive(Clone, Debug, Default)]
pub struct SimCache {
    entries: HashMap<OperatorKey, Matrix>,
    hits: usize,
    misses: usize,
}

impl SimCache {
    /// Create a new, empty cache.
    pub fn new() -> Self { Self::default() }

    /// Return the dense matrix of `op`, materializing and storing it on the
    /// first request for its key.
    pub fn get_materialized(&mut self, op: &Operator) -> &Matrix {
        let key = op.key();
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            trace!(op = %op, "materializing operator");
        }
        self.entries.entry(key).or_insert_with(|| op.materialize())
    }

    /// Remove all stored matrices and reset the hit and miss counts.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Return the number of stored matrices.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Return `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Return the number of requests served from storage.
    pub fn hits(&self) -> usize { self.hits }

    /// Return the number of requests that required materialization.
    pub fn misses(&self) -> usize { self.misses }
}
