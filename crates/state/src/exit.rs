use rangechain_primitives::{Address, BigAmount, Hash32};
use serde::{Deserialize, Serialize};

/// An exit request against a range of a token's coin-space (spec.md §3).
///
/// `completed` is intentionally not a field: it is derived from
/// `block + challenge_period < current_anchor_block` by
/// [`Exit::is_completed`], not persisted, so there is nowhere for it to go
/// stale. `finalized` *is* persisted — it is the terminal mark ChainStore
/// writes once the anchor chain confirms the withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub id: Hash32,
    pub owner: Address,
    pub token: BigAmount,
    pub start: BigAmount,
    pub end: BigAmount,
    pub block: u64,
    pub finalized: bool,
}

impl Exit {
    pub fn new(
        id: Hash32,
        owner: Address,
        token: BigAmount,
        start: BigAmount,
        end: BigAmount,
        block: u64,
    ) -> Self {
        Self {
            id,
            owner,
            token,
            start,
            end,
            block,
            finalized: false,
        }
    }

    /// True once the challenge period has elapsed relative to
    /// `current_anchor_block`.
    pub fn is_completed(&self, current_anchor_block: u64, challenge_period: u64) -> bool {
        self.block + challenge_period < current_anchor_block
    }
}
