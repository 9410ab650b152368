//! # Reference Ledger
//!
//! Per-node bookkeeping of incoming edges: "who points at me, under which
//! relation". Every graph node composes one `Ledger` and implements
//! `GraphNode` to expose it.
//!
//! The ledger never deduplicates. Entity accessors only call `record` after
//! a forward-set insertion actually changed membership, which keeps exactly
//! one reverse entry per forward edge.

use crate::{NodeRef, RelationId};
use std::collections::BTreeMap;

// =============================================================================
// LEDGER
// =============================================================================

/// Reverse index keyed by relation id.
///
/// Entries under one relation keep their recording order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger<R = RelationId, S = NodeRef> {
    entries: BTreeMap<R, Vec<S>>,
}

impl<R, S> Default for Ledger<R, S> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<R: Ord + Copy, S: PartialEq + Copy> Ledger<R, S> {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `source` under `relation`.
    pub fn record(&mut self, relation: R, source: S) {
        self.entries.entry(relation).or_default().push(source);
    }

    /// Remove the first `(relation, source)` entry. No-op if absent.
    pub fn forget(&mut self, relation: R, source: S) {
        if let Some(sources) = self.entries.get_mut(&relation) {
            if let Some(index) = sources.iter().position(|s| *s == source) {
                sources.remove(index);
            }
            if sources.is_empty() {
                self.entries.remove(&relation);
            }
        }
    }

    /// Sources recorded under `relation`, in recording order.
    #[must_use]
    pub fn incoming(&self, relation: R) -> &[S] {
        self.entries.get(&relation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when `(relation, source)` has at least one entry.
    #[must_use]
    pub fn contains(&self, relation: R, source: S) -> bool {
        self.incoming(relation).contains(&source)
    }

    /// All `(relation, source)` pairs, by relation then recording order.
    pub fn iter(&self) -> impl Iterator<Item = (R, S)> + '_ {
        self.entries
            .iter()
            .flat_map(|(relation, sources)| sources.iter().map(move |s| (*relation, *s)))
    }

    /// Total number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// True when nothing points at this node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the ledger, returning every pair it held.
    pub fn take(&mut self) -> Vec<(R, S)> {
        let drained = self.iter().collect();
        self.entries.clear();
        drained
    }
}

// =============================================================================
// GRAPHNODE TRAIT
// =============================================================================

/// A node that can be pointed at and that may point at others.
///
/// `detach` is the cascading-detach hook: remove `target` from the forward
/// set that `relation` names. Nodes without outgoing relations keep the
/// default no-op.
pub trait GraphNode {
    /// The node's reverse index.
    fn ledger(&self) -> &Ledger;

    /// Mutable access to the reverse index.
    fn ledger_mut(&mut self) -> &mut Ledger;

    /// Drop `target` from the forward set named by `relation`.
    fn detach(&mut self, _relation: RelationId, _target: NodeRef) {}
}

// =============================================================================
// TESTS
// =============================================================================
