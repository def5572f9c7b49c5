use async_trait::async_trait;
use thiserror::Error;

/// External predicate evaluator (spec.md §4.C, §9 Design Notes).
///
/// `rangechain-proof-verifier` does not implement predicate bytecode
/// execution itself (explicitly out of scope); it asks this capability
/// whether a witness authorizes the transition from `old_state` to
/// `new_state` under the given `bytecode`.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait ContractClient: Send + Sync {
    async fn valid_state_transition(
        &self,
        bytecode: &[u8],
        old_state: &[u8],
        new_state: &[u8],
        witness: &[u8],
    ) -> Result<bool, ContractClientError>;
}

#[derive(Debug, Error)]
pub enum ContractClientError {
    #[error("predicate evaluation reverted: {0}")]
    Reverted(String),

    #[error("network error: {0}")]
    Network(String),
}
