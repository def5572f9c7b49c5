use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventWatcherError {
    #[error("anchor client error: {0}")]
    Anchor(#[from] rangechain_client_traits::AnchorClientError),
    #[error("storage error: {0}")]
    Storage(#[from] rangechain_chain_store::StorageError),
}
