use thiserror::Error;

/// Storage errors, shaped after the teacher's
/// `alpen_ee_common::traits::storage::StorageError`: a handful of named
/// cases plus catch-all `Database`/`Serialization`/`Deserialization`
/// buckets for the underlying sled/bincode failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("storage invariant violated: {0}")]
    InvariantViolated(String),

    #[error("no block header stored for block {0}")]
    MissingBlockHeader(u64),
}

impl StorageError {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn invariant_violated(msg: impl Into<String>) -> Self {
        Self::InvariantViolated(msg.into())
    }
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
