use thiserror::Error;

/// Failure modes of the [`crate::ChainService`] façade (spec.md §4.H).
#[derive(Debug, Error)]
pub enum ChainServiceError {
    #[error("storage error: {0}")]
    Storage(#[from] rangechain_chain_store::StorageError),

    #[error("invalid range: {0}")]
    InvalidRange(#[from] rangechain_range_store::RangeStoreError),

    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] rangechain_primitives::ArithmeticError),

    #[error("invalid proof: {0}")]
    InvalidProof(#[from] rangechain_proof_verifier::ProofError),

    #[error("anchor client error: {0}")]
    Anchor(#[from] rangechain_client_traits::AnchorClientError),

    #[error("operator client error: {0}")]
    Operator(#[from] rangechain_client_traits::OperatorClientError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient balance")]
    InsufficientBalance,
}

impl From<ChainServiceError> for rangechain_errors::CoreError {
    fn from(err: ChainServiceError) -> Self {
        match err {
            ChainServiceError::Storage(e) => rangechain_errors::CoreError::Storage(e),
            ChainServiceError::InvalidRange(e) => rangechain_errors::CoreError::InvalidRange(e),
            ChainServiceError::Arithmetic(e) => rangechain_errors::CoreError::Arithmetic(e),
            ChainServiceError::InvalidProof(e) => rangechain_errors::CoreError::InvalidProof(e),
            ChainServiceError::Anchor(e) => rangechain_errors::CoreError::Anchor(e),
            ChainServiceError::Operator(e) => rangechain_errors::CoreError::Operator(e),
            ChainServiceError::NotFound(msg) => rangechain_errors::CoreError::NotFound(msg),
            ChainServiceError::InsufficientBalance => rangechain_errors::CoreError::InsufficientBalance,
        }
    }
}
