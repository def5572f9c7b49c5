use rangechain_primitives::Address;
use thiserror::Error;

/// Local signing capability (spec.md §9 Design Notes).
///
/// Synchronous and `mockall::automock`-able like the others; signing itself
/// never needs to await (key material lives locally).
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait WalletSigner: Send + Sync {
    fn accounts(&self) -> Vec<Address>;

    fn sign(&self, account: Address, message: &[u8]) -> Result<Vec<u8>, WalletSignerError>;

    fn create_account(&self) -> Result<Address, WalletSignerError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletSignerError {
    #[error("unknown account: {0}")]
    UnknownAccount(Address),

    #[error("signing backend error: {0}")]
    Backend(String),
}
