//! Demo-weight implementations of the `rangechain-client-traits` capability
//! traits, wired up by this binary when no production adapter is
//! configured.
//!
//! Per SPEC_FULL.md §1, a production Ethereum JSON-RPC client, operator
//! HTTP client and keystore are out of scope for this workspace; what
//! remains in scope is proving the service graph actually wires together
//! and runs. Mirrors the teacher's per-binary dummy client pattern
//! (`bin/alpen-client/src/dummy_ol_client.rs`): one small, honest stand-in
//! per trait, kept in the binary rather than the library crate that
//! defines the trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use rangechain_client_traits::{
    AnchorClient, AnchorClientError, AnchorEvent, ContractClient, ContractClientError,
    OperatorClient, OperatorClientError, WalletSigner, WalletSignerError,
};
use rangechain_primitives::{Address, BigAmount, Hash32};
use rangechain_state::{StateObject, Transaction, TransactionProof};

/// Never produces anchor events, always reports deposits valid and
/// predicates trivially approved — a stand-in for a chain with no
/// operator activity, good enough to prove `EventWatcher`/`ProofVerifier`
/// wiring without a real JSON-RPC endpoint.
#[derive(Debug, Default)]
pub struct DummyAnchorClient {
    head_height: u64,
}

impl DummyAnchorClient {
    pub fn new(head_height: u64) -> Self {
        Self { head_height }
    }
}

#[async_trait]
impl AnchorClient for DummyAnchorClient {
    async fn head_height(&self) -> Result<u64, AnchorClientError> {
        Ok(self.head_height)
    }

    async fn get_events(
        &self,
        _event_name: &str,
        _from: u64,
        _to: u64,
    ) -> Result<Vec<AnchorEvent>, AnchorClientError> {
        Ok(Vec::new())
    }

    async fn deposit_valid(&self, _deposit: &StateObject) -> Result<bool, AnchorClientError> {
        Ok(true)
    }

    async fn get_predicate_bytecode(&self, _predicate_addr: &[u8]) -> Result<Vec<u8>, AnchorClientError> {
        Ok(vec![0x00])
    }

    async fn finalize_exit(
        &self,
        exit_id: Hash32,
        _exitable_end: &BigAmount,
        _owner: Address,
    ) -> Result<Hash32, AnchorClientError> {
        Ok(exit_id)
    }
}

/// Reports no received transactions and accepts every submission — there
/// is no real operator to batch transitions in this demo.
#[derive(Debug, Default)]
pub struct DummyOperatorClient;

#[async_trait]
impl OperatorClient for DummyOperatorClient {
    async fn get_received_transactions(
        &self,
        _account: Address,
        _from_block: u64,
        _to_block: u64,
    ) -> Result<Vec<(Transaction, TransactionProof)>, OperatorClientError> {
        Ok(Vec::new())
    }

    async fn send_transaction(&self, _transaction: Transaction) -> Result<(), OperatorClientError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), OperatorClientError> {
        Ok(())
    }
}

/// Approves every transition — `rangechain-proof-verifier` exercises its
/// own pipeline against this, but predicate bytecode execution itself is
/// explicitly out of scope (spec.md §1 Non-goals).
#[derive(Debug, Default)]
pub struct DummyContractClient;

#[async_trait]
impl ContractClient for DummyContractClient {
    async fn valid_state_transition(
        &self,
        _bytecode: &[u8],
        _old_state: &[u8],
        _new_state: &[u8],
        _witness: &[u8],
    ) -> Result<bool, ContractClientError> {
        Ok(true)
    }
}

/// Allocates sequential demo accounts and "signs" by prefixing the
/// message with the account's key byte — no real key material involved,
/// matching the scope boundary that a production keystore is out of
/// scope (spec.md §1 Non-goals).
#[derive(Debug, Default)]
pub struct DummyWallet {
    accounts: RwLock<HashMap<Address, u8>>,
    next_key_byte: AtomicU8,
}

impl DummyWallet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WalletSigner for DummyWallet {
    fn accounts(&self) -> Vec<Address> {
        self.accounts.read().unwrap().keys().copied().collect()
    }

    fn sign(&self, account: Address, message: &[u8]) -> Result<Vec<u8>, WalletSignerError> {
        let accounts = self.accounts.read().unwrap();
        let key_byte = accounts
            .get(&account)
            .ok_or(WalletSignerError::UnknownAccount(account))?;
        let mut signature = vec![*key_byte];
        signature.extend_from_slice(message);
        Ok(signature)
    }

    fn create_account(&self) -> Result<Address, WalletSignerError> {
        let key_byte = self.next_key_byte.fetch_add(1, Ordering::SeqCst);
        let mut bytes = [0u8; 20];
        bytes[19] = key_byte;
        let account = Address::new(bytes);
        self.accounts.write().unwrap().insert(account, key_byte);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dummy_anchor_client_reports_configured_height() {
        let client = DummyAnchorClient::new(7);
        assert_eq!(client.head_height().await.unwrap(), 7);
    }

    #[test]
    fn dummy_wallet_allocates_distinct_accounts() {
        let wallet = DummyWallet::new();
        let a = wallet.create_account().unwrap();
        let b = wallet.create_account().unwrap();
        assert_ne!(a, b);
    }
}
