use thiserror::Error;

/// Failure modes of [`crate::ProofVerifier::verify`], per spec.md §4.C.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("deposit failed anchor-chain validation")]
    InvalidDeposit,
    #[error("inclusion proof did not verify against the stored block root")]
    InvalidInclusion,
    #[error("predicate rejected the state transition")]
    InvalidTransition,
    #[error("no block header stored for block {0}")]
    MissingBlockRoot(u64),
    #[error("predicate bytecode unavailable for {0}")]
    UnknownPredicate(String),
    #[error("storage error: {0}")]
    Storage(#[from] rangechain_chain_store::StorageError),
    #[error("anchor client error: {0}")]
    Anchor(#[from] rangechain_client_traits::AnchorClientError),
    #[error("contract client error: {0}")]
    Contract(#[from] rangechain_client_traits::ContractClientError),
    #[error("malformed state object: {0}")]
    MalformedState(#[from] rangechain_state::StateObjectError),
}
