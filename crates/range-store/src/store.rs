use rangechain_primitives::BigAmount;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeStoreError {
    #[error("invalid range: start {start} >= end {end}")]
    InvalidRange { start: String, end: String },
}

/// The minimal shape a `RangeStore` entry must have: bounds and a block
/// height used to resolve overlaps, plus the ability to produce a copy of
/// itself re-bounded or re-blocked (used when splitting/overwriting).
pub trait RangeEntry: Clone {
    fn start(&self) -> BigAmount;
    fn end(&self) -> BigAmount;
    fn block(&self) -> BigAmount;

    /// A copy of this entry with different bounds, all other fields kept.
    fn with_bounds(&self, start: BigAmount, end: BigAmount) -> Self;

    /// A copy of this entry with a different block height, all other
    /// fields kept.
    fn with_block(&self, block: BigAmount) -> Self;
}

/// A sorted, non-overlapping collection of `T`.
///
/// Invariant maintained by every public method: no two entries have
/// overlapping `[start, end)` ranges. Iteration order is always by
/// `(start, end)` ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeStore<T: RangeEntry> {
    entries: Vec<T>,
}

impl<T: RangeEntry> RangeStore<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All entries, in `(start, end)` ascending order.
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.start().cmp(&b.start()).then(a.end().cmp(&b.end())));
    }

    /// Entries whose `[start, end)` intersects `[start, end)`.
    pub fn get_overlapping(&self, start: &BigAmount, end: &BigAmount) -> Vec<&T> {
        self.entries
            .iter()
            .filter(|e| ranges_overlap(&e.start(), &e.end(), start, end))
            .collect()
    }

    /// Inserts `r`, resolving every overlap with an existing entry by
    /// comparing block heights: the higher block wins. On a tie, the
    /// existing entry wins (the new range is *not* superseding).
    pub fn add_range(&mut self, r: T) -> Result<(), RangeStoreError> {
        let (r_start, r_end) = (r.start(), r.end());
        if r_start >= r_end {
            return Err(RangeStoreError::InvalidRange {
                start: r_start.to_string(),
                end: r_end.to_string(),
            });
        }

        let mut overlapping_idx: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| ranges_overlap(&e.start(), &e.end(), &r_start, &r_end))
            .map(|(i, _)| i)
            .collect();
        overlapping_idx.sort_by(|&a, &b| self.entries[a].start().cmp(&self.entries[b].start()));

        // Slices of `r` not yet ruled out by a surviving (equal-or-higher
        // block) existing entry.
        let mut remaining: Vec<(BigAmount, BigAmount)> = vec![(r_start.clone(), r_end.clone())];
        let mut to_clear: Vec<(BigAmount, BigAmount)> = Vec::new();

        for idx in overlapping_idx {
            let e = &self.entries[idx];
            let overlap_start = max(&e.start(), &r_start);
            let overlap_end = min(&e.end(), &r_end);
            if overlap_start >= overlap_end {
                continue;
            }
            if e.block() < r.block() {
                // existing entry is strictly lower block: it gets cleared,
                // `r`'s slice over this overlap survives.
                to_clear.push((overlap_start, overlap_end));
            } else {
                // e.block() >= r.block(): existing entry wins (ties go to
                // the existing entry too), `r`'s slice is dropped.
                remaining = subtract(remaining, &overlap_start, &overlap_end);
            }
        }

        for (s, e) in to_clear {
            self.remove_range(&s, &e);
        }

        for (s, e) in remaining {
            debug!(start = %s, end = %e, block = %r.block(), "range-store: inserting slice");
            self.entries.push(r.with_bounds(s, e));
        }

        self.sort();
        Ok(())
    }

    /// Deletes every entry overlapping `[start, end)`, reinserting the
    /// non-overlapping left/right remainders of any entry that was only
    /// partially covered.
    pub fn remove_range(&mut self, start: &BigAmount, end: &BigAmount) {
        let mut kept = Vec::with_capacity(self.entries.len());
        let mut remainders = Vec::new();

        for e in self.entries.drain(..) {
            if !ranges_overlap(&e.start(), &e.end(), start, end) {
                kept.push(e);
                continue;
            }
            let overlap_start = max(&e.start(), start);
            let overlap_end = min(&e.end(), end);
            if e.start() < overlap_start {
                remainders.push(e.with_bounds(e.start(), overlap_start.clone()));
            }
            if overlap_end < e.end() {
                remainders.push(e.with_bounds(overlap_end.clone(), e.end()));
            }
        }

        kept.extend(remainders);
        self.entries = kept;
        self.sort();
    }

    /// Advances the block height of every entry fully contained in
    /// `[start, end)` whose current block equals `range_block - 1`.
    pub fn increment_blocks(&mut self, start: &BigAmount, end: &BigAmount, range_block: &BigAmount) {
        if range_block.is_zero() {
            // no entry can have block `-1`; nothing to do.
            return;
        }
        let prior = range_block
            .checked_sub(&BigAmount::from_u64(1))
            .expect("checked above: range_block is non-zero");

        for e in self.entries.iter_mut() {
            if e.start() >= *start && e.end() <= *end && e.block() == prior {
                *e = e.with_block(range_block.clone());
            }
        }
    }
}

fn ranges_overlap(a_start: &BigAmount, a_end: &BigAmount, b_start: &BigAmount, b_end: &BigAmount) -> bool {
    a_start < b_end && b_start < a_end
}

fn max(a: &BigAmount, b: &BigAmount) -> BigAmount {
    if a >= b {
        a.clone()
    } else {
        b.clone()
    }
}

fn min(a: &BigAmount, b: &BigAmount) -> BigAmount {
    if a <= b {
        a.clone()
    } else {
        b.clone()
    }
}

/// Subtracts `[cut_start, cut_end)` from a set of disjoint, non-adjacent
/// intervals, splitting any interval that straddles the cut.
fn subtract(
    intervals: Vec<(BigAmount, BigAmount)>,
    cut_start: &BigAmount,
    cut_end: &BigAmount,
) -> Vec<(BigAmount, BigAmount)> {
    let mut out = Vec::with_capacity(intervals.len());
    for (s, e) in intervals {
        if e <= *cut_start || *cut_end <= s {
            out.push((s, e));
            continue;
        }
        if s < *cut_start {
            out.push((s.clone(), cut_start.clone()));
        }
        if *cut_end < e {
            out.push((cut_end.clone(), e));
        }
    }
    out
}
