//! Hand-written in-memory doubles for integration tests that need
//! deterministic, stateful behavior `mockall`'s per-call expectations don't
//! fit well (e.g. a wallet that must remember accounts it created).
//!
//! `mockall::automock` (enabled by this same `test-utils` feature) covers
//! the single-call-expectation cases; use `MockAnchorClient` etc. for those.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rangechain_primitives::Address;
use rangechain_state::{Transaction, TransactionProof};

use crate::operator::{OperatorClient, OperatorClientError};
use crate::wallet::{WalletSigner, WalletSignerError};

/// An in-memory [`WalletSigner`] that "signs" by concatenating the
/// account's fixed key byte with the message, and allocates sequential
/// account addresses on `create_account`.
#[derive(Debug, Default)]
pub struct InMemoryWallet {
    accounts: RwLock<HashMap<Address, u8>>,
    next_key_byte: RwLock<u8>,
}

impl InMemoryWallet {
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: Address, key_byte: u8) -> Self {
        self.accounts.write().unwrap().insert(account, key_byte);
        self
    }
}

impl WalletSigner for InMemoryWallet {
    fn accounts(&self) -> Vec<Address> {
        self.accounts.read().unwrap().keys().copied().collect()
    }

    fn sign(&self, account: Address, message: &[u8]) -> Result<Vec<u8>, WalletSignerError> {
        let accounts = self.accounts.read().unwrap();
        let key_byte = accounts
            .get(&account)
            .ok_or(WalletSignerError::UnknownAccount(account))?;
        let mut sig = vec![*key_byte];
        sig.extend_from_slice(message);
        Ok(sig)
    }

    fn create_account(&self) -> Result<Address, WalletSignerError> {
        let mut next = self.next_key_byte.write().unwrap();
        let key_byte = *next;
        *next = next.wrapping_add(1);
        let mut bytes = [0u8; 20];
        bytes[19] = key_byte;
        let account = Address::new(bytes);
        self.accounts.write().unwrap().insert(account, key_byte);
        Ok(account)
    }
}

/// An [`crate::AnchorClient`] that never produces events and always reports
/// deposits valid — a permissive stand-in for tests that only exercise the
/// code paths downstream of "the anchor chain said yes".
#[derive(Debug, Default)]
pub struct PermissiveAnchorClient {
    pub head_height: u64,
}

#[async_trait]
impl crate::AnchorClient for PermissiveAnchorClient {
    async fn head_height(&self) -> Result<u64, crate::AnchorClientError> {
        Ok(self.head_height)
    }

    async fn get_events(
        &self,
        _event_name: &str,
        _from: u64,
        _to: u64,
    ) -> Result<Vec<crate::AnchorEvent>, crate::AnchorClientError> {
        Ok(Vec::new())
    }

    async fn deposit_valid(
        &self,
        _deposit: &rangechain_state::StateObject,
    ) -> Result<bool, crate::AnchorClientError> {
        Ok(true)
    }

    async fn get_predicate_bytecode(
        &self,
        _predicate_addr: &[u8],
    ) -> Result<Vec<u8>, crate::AnchorClientError> {
        Ok(Vec::new())
    }

    async fn finalize_exit(
        &self,
        exit_id: rangechain_primitives::Hash32,
        _exitable_end: &rangechain_primitives::BigAmount,
        _owner: Address,
    ) -> Result<rangechain_primitives::Hash32, crate::AnchorClientError> {
        Ok(exit_id)
    }
}
