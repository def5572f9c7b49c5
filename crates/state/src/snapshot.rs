use std::collections::BTreeMap;

use rangechain_primitives::{token_of, Address, ArithmeticError, BigAmount};
use rangechain_range_store::{RangeEntry, RangeStore, RangeStoreError};
use tracing::warn;

use crate::object::StateObject;
use crate::transaction::Transaction;

/// One piece of a `StateObject`'s decomposition: either the explicit
/// `[start, end)` range (applied by overwrite) or an implicit left/right
/// range inherited from the sum-tree proof's wider bounds (applied by
/// incrementing the existing entries' block, per spec.md §4.B).
struct Component {
    object: StateObject,
    implicit: bool,
}

fn decompose(obj: &StateObject) -> Vec<Component> {
    let (Some(implicit_start), Some(implicit_end)) = (obj.implicit_start(), obj.implicit_end())
    else {
        return vec![Component {
            object: obj.clone(),
            implicit: false,
        }];
    };

    let mut components = Vec::with_capacity(3);
    if implicit_start < obj.start() {
        components.push(Component {
            object: obj.with_bounds(implicit_start.clone(), obj.start().clone()),
            implicit: true,
        });
    }
    if obj.end() < implicit_end {
        components.push(Component {
            object: obj.with_bounds(obj.end().clone(), implicit_end.clone()),
            implicit: true,
        });
    }
    components.push(Component {
        object: obj.clone(),
        implicit: false,
    });
    components
}

/// Wraps a [`RangeStore<StateObject>`] and applies deposits and
/// transitions to it, per spec.md §4.B.
/// Two managers compare equal iff their underlying range stores hold the
/// same entries in the same order — `applyProof` run twice on identical
/// input must produce equal managers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotManager {
    range_store: RangeStore<StateObject>,
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self {
            range_store: RangeStore::new(),
        }
    }

    pub fn range_store(&self) -> &RangeStore<StateObject> {
        &self.range_store
    }

    /// Applies a deposit. Deposits should not overlap existing state, but
    /// if one does (e.g. an already-exited region still in flight), the
    /// higher-block policy in `RangeStore::add_range` resolves it.
    pub fn apply_deposit(&mut self, deposit: StateObject) -> Result<(), RangeStoreError> {
        self.range_store.add_range(deposit)
    }

    /// Applies a transition's `newState`, decomposed into its components:
    /// implicit components advance the block of the entries they cover,
    /// the explicit component overwrites via `add_range`.
    pub fn apply_transition(&mut self, tx: &Transaction) -> Result<(), RangeStoreError> {
        for component in decompose(tx.new_state()) {
            if component.implicit {
                self.range_store.increment_blocks(
                    component.object.start(),
                    component.object.end(),
                    component.object.block(),
                );
            } else {
                self.range_store.add_range(component.object)?;
            }
        }
        Ok(())
    }

    /// Removes `[start, end)` from head state (spec.md §4.H `addExit`).
    ///
    /// Shrinks the covering range(s) rather than leaving a null-owner
    /// marker in their place (see `DESIGN.md`): an exited range is simply
    /// absent from head state afterward, with the exit's own persisted
    /// record in `ChainStore` remaining the source of truth that it was
    /// ever exited.
    pub fn apply_exit(&mut self, start: &BigAmount, end: &BigAmount) {
        self.range_store.remove_range(start, end);
    }

    /// True iff some overlapping entry equals `s` on the five core fields.
    pub fn has_state_object(&self, s: &StateObject) -> bool {
        self.range_store
            .get_overlapping(s.start(), s.end())
            .into_iter()
            .any(|e| e == s)
    }

    /// Entries currently overlapping `s`'s bounds (defensive copies).
    pub fn get_old_states(&self, s: &StateObject) -> Vec<StateObject> {
        self.range_store
            .get_overlapping(s.start(), s.end())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Merges another manager's state into this one. Individual
    /// `add_range` errors are swallowed so the merge as a whole is total,
    /// per spec.md §4.B.
    pub fn merge(&mut self, other: &SnapshotManager) {
        for entry in other.range_store.entries() {
            if let Err(err) = self.range_store.add_range(entry.clone()) {
                warn!(%err, "snapshot merge: dropping unmergeable entry");
            }
        }
    }

    /// Ranges whose `state` bytes decode to `owner` under the ownership
    /// convention in `StateObject::owner`.
    pub fn owned_ranges(&self, owner: Address) -> Vec<StateObject> {
        self.range_store
            .entries()
            .iter()
            .filter(|e| e.owner() == Some(owner))
            .cloned()
            .collect()
    }

    /// Sums range lengths owned by `owner`, grouped by token (see
    /// `DESIGN.md` for the position-to-token convention).
    pub fn balances(
        &self,
        owner: Address,
        token_segment_size: &BigAmount,
    ) -> Result<BTreeMap<BigAmount, BigAmount>, ArithmeticError> {
        let mut balances = BTreeMap::new();
        for range in self.owned_ranges(owner) {
            let token = token_of(range.start(), token_segment_size)?;
            let length = range.end().checked_sub(range.start()).expect("end > start invariant");
            let entry = balances.entry(token).or_insert_with(BigAmount::zero);
            *entry = entry.checked_add(&length);
        }
        Ok(balances)
    }
}
