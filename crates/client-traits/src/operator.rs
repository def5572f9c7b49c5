use async_trait::async_trait;
use rangechain_primitives::Address;
use rangechain_state::{Transaction, TransactionProof};
use thiserror::Error;

/// Client interface for the plasma operator (spec.md §4.G sync pipeline,
/// §4.H `ChainService::send_transaction`).
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait OperatorClient: Send + Sync {
    /// Transactions received by `account` in block range `[from, to]`, each
    /// paired with the proof needed to re-verify it locally.
    async fn get_received_transactions(
        &self,
        account: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<(Transaction, TransactionProof)>, OperatorClientError>;

    /// Submits a signed transaction for inclusion in the next block.
    async fn send_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<(), OperatorClientError>;

    /// Liveness check; `rangechain-sync::sync_wallet_transactions` skips a
    /// pass rather than fetching transactions from an offline operator.
    async fn ping(&self) -> Result<(), OperatorClientError>;
}

#[derive(Debug, Error)]
pub enum OperatorClientError {
    #[error("operator rejected transaction: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

impl OperatorClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Rpc(_))
    }
}
