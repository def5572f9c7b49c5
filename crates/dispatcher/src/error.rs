use thiserror::Error;

/// The stable RPC error taxonomy (spec.md §4.J): every dispatch failure
/// maps to exactly one of these five codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("parse error")]
    ParseError,

    #[error("invalid request")]
    InvalidRequest,

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// The JSON-RPC 2.0 reserved code for this error's category.
    pub fn code(&self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal(_) => -32603,
        }
    }
}

impl From<rangechain_chain_store::StorageError> for DispatchError {
    fn from(err: rangechain_chain_store::StorageError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<rangechain_client_traits::WalletSignerError> for DispatchError {
    fn from(err: rangechain_client_traits::WalletSignerError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_the_stable_taxonomy() {
        assert_eq!(DispatchError::ParseError.code(), -32700);
        assert_eq!(DispatchError::InvalidRequest.code(), -32600);
        assert_eq!(DispatchError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(DispatchError::InvalidParams("x".into()).code(), -32602);
        assert_eq!(DispatchError::Internal("x".into()).code(), -32603);
    }
}
