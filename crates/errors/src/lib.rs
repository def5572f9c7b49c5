//! The top-level error taxonomy (spec.md §7) that every crate's local error
//! enum converts into at a service boundary, mirroring the teacher's split
//! between leaf errors (`StorageError`, `DepositError`, ...) and one
//! umbrella enum each handler ultimately reports through.
//!
//! Crates already in this crate's dependency graph get a `#[from]`
//! conversion here. Crates built on top of `rangechain-errors`
//! (`rangechain-service-graph`, `rangechain-dispatcher`,
//! `rangechain-chain-service`) instead `impl From<TheirLocalError> for
//! CoreError` in their own crate — the orphan rule allows this because their
//! local error type is the one appearing in the impl.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("service not started: {0}")]
    ServiceNotStarted(String),

    #[error("dependency cycle detected among services: {0}")]
    DependencyCycle(String),

    #[error("service {service} depends on {dependency}, which has not started")]
    DependencyNotStarted { service: String, dependency: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid proof: {0}")]
    InvalidProof(#[from] rangechain_proof_verifier::ProofError),

    #[error("invalid range: {0}")]
    InvalidRange(#[from] rangechain_range_store::RangeStoreError),

    #[error("malformed state object: {0}")]
    MalformedState(#[from] rangechain_state::StateObjectError),

    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] rangechain_primitives::ArithmeticError),

    #[error("storage error: {0}")]
    Storage(#[from] rangechain_chain_store::StorageError),

    #[error("anchor client error: {0}")]
    Anchor(#[from] rangechain_client_traits::AnchorClientError),

    #[error("operator client error: {0}")]
    Operator(#[from] rangechain_client_traits::OperatorClientError),

    #[error("contract client error: {0}")]
    Contract(#[from] rangechain_client_traits::ContractClientError),

    #[error("wallet signer error: {0}")]
    Wallet(#[from] rangechain_client_traits::WalletSignerError),

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("operator is offline")]
    OperatorOffline,

    #[error("anchor chain is offline")]
    AnchorOffline,
}

impl CoreError {
    /// Transient errors (offline probes, retryable client errors) are worth
    /// surfacing to a caller as retriable; invariant violations are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::OperatorOffline | Self::AnchorOffline => true,
            Self::Anchor(e) => e.is_retryable(),
            Self::Operator(e) => e.is_retryable(),
            _ => false,
        }
    }
}
