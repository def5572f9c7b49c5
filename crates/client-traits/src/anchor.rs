use async_trait::async_trait;
use rangechain_primitives::{Address, BigAmount, Hash32};
use rangechain_state::StateObject;
use thiserror::Error;

use crate::event::AnchorEvent;

/// Client interface for the anchor chain (spec.md §4.F, §9 Design Notes).
///
/// Covers the two things `rangechain-event-watcher` and
/// `rangechain-proof-verifier` need from the anchor chain: polling for logs
/// up to a finality-delayed height, and the deposit-validity/predicate-
/// bytecode lookups a contract call would otherwise serve.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait AnchorClient: Send + Sync {
    /// Current anchor-chain block height.
    async fn head_height(&self) -> Result<u64, AnchorClientError>;

    /// Logs for `event_name` in the inclusive range `[from, to]`, in
    /// `(block_number, log_index)` order.
    async fn get_events(
        &self,
        event_name: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<AnchorEvent>, AnchorClientError>;

    /// Whether `deposit` is backed by a real, unspent anchor-chain deposit.
    async fn deposit_valid(&self, deposit: &StateObject) -> Result<bool, AnchorClientError>;

    /// Fetches a predicate contract's bytecode, for
    /// `rangechain-proof-verifier`'s write-through cache.
    async fn get_predicate_bytecode(&self, predicate_addr: &[u8]) -> Result<Vec<u8>, AnchorClientError>;

    /// Invokes the anchor contract's `finalizeExit(id, exitableEnd, owner)`,
    /// returning the anchor-chain transaction hash of the submitted call
    /// (spec.md §4.H `finalizeExits`).
    async fn finalize_exit(
        &self,
        exit_id: Hash32,
        exitable_end: &BigAmount,
        owner: Address,
    ) -> Result<Hash32, AnchorClientError>;
}

#[derive(Debug, Error)]
pub enum AnchorClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

impl AnchorClientError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(msg.into())
    }

    /// All variants here are transient transport errors, worth a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Rpc(_))
    }
}
