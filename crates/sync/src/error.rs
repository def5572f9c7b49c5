use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unrecognised anchor event name: {0}")]
    UnknownEvent(String),

    #[error("anchor event {event} missing return value {field}")]
    MissingField { event: String, field: String },

    #[error("anchor event {event} field {field} is malformed: {reason}")]
    MalformedField {
        event: String,
        field: String,
        reason: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rangechain_chain_store::StorageError),

    #[error("chain service error: {0}")]
    ChainService(#[from] rangechain_chain_service::ChainServiceError),

    #[error("malformed state object: {0}")]
    MalformedState(#[from] rangechain_state::StateObjectError),

    #[error("operator client error: {0}")]
    Operator(#[from] rangechain_client_traits::OperatorClientError),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl From<SyncError> for Box<dyn std::error::Error + Send + Sync> {
    fn from(err: SyncError) -> Self {
        Box::new(err)
    }
}
