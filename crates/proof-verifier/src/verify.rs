use std::collections::HashMap;
use std::sync::Arc;

use rangechain_chain_store::ChainStore;
use rangechain_client_traits::{AnchorClient, ContractClient};
use rangechain_primitives::Address;
use rangechain_state::{SnapshotManager, StateObject, Transaction, TransactionProof};
use tracing::instrument;

use crate::error::ProofError;
use crate::sumtree::SumTreeVerifier;

/// Validates a transaction against its supporting proof and assembles the
/// resulting post-state, per spec.md §4.C.
///
/// Holds its external collaborators behind `Arc<dyn Trait>` so a single
/// verifier can be shared across concurrent `verify` calls — mirroring the
/// teacher's multi-step validate-then-assemble pipelines
/// (`crates/asm/subprotocols/checkpoint/src/verification.rs`), which
/// validate every precondition before assembling their output rather than
/// interleaving validation with mutation.
pub struct ProofVerifier {
    chain_store: Arc<ChainStore>,
    anchor_client: Arc<dyn AnchorClient>,
    contract_client: Arc<dyn ContractClient>,
    sum_tree: Arc<dyn SumTreeVerifier>,
}

impl ProofVerifier {
    pub fn new(
        chain_store: Arc<ChainStore>,
        anchor_client: Arc<dyn AnchorClient>,
        contract_client: Arc<dyn ContractClient>,
        sum_tree: Arc<dyn SumTreeVerifier>,
    ) -> Self {
        Self {
            chain_store,
            anchor_client,
            contract_client,
            sum_tree,
        }
    }

    #[instrument(skip(self, tx, proof))]
    pub async fn verify(
        &self,
        tx: &Transaction,
        proof: TransactionProof,
    ) -> Result<SnapshotManager, ProofError> {
        let (deposits, transactions) = proof.into_parts();

        // Step 1: validate deposits.
        for deposit in &deposits {
            if !self.anchor_client.deposit_valid(deposit).await? {
                return Err(ProofError::InvalidDeposit);
            }
        }

        // Step 2: validate inclusion proofs, attaching derived implicit
        // bounds to each transaction's `newState`.
        let mut transactions_with_bounds = Vec::with_capacity(transactions.len());
        for t in transactions {
            let root = self
                .chain_store
                .get_block_header(t.block())?
                .ok_or(ProofError::MissingBlockRoot(t.block()))?;

            let leaf_len = t
                .new_state()
                .end()
                .checked_sub(t.new_state().start())
                .expect("StateObject invariant guarantees end > start");

            let (implicit_start, implicit_end) = self
                .sum_tree
                .verify_and_get_implicit_bounds(
                    &leaf_len,
                    &t.new_state().encoded(),
                    t.inclusion_proof(),
                    root,
                )
                .map_err(|_| ProofError::InvalidInclusion)?;

            let new_state = t
                .new_state()
                .clone()
                .with_implicit_bounds(implicit_start, implicit_end)?;
            transactions_with_bounds.push(Transaction::new(
                t.block(),
                t.inclusion_proof().to_vec(),
                t.witness().to_vec(),
                new_state,
            ));
        }
        transactions_with_bounds.sort_by_key(|t| t.block());

        // Step 3-4: prepare post-state and apply deposits.
        let mut post_state = SnapshotManager::new();
        for deposit in deposits {
            post_state.apply_deposit(deposit)?;
        }

        // Step 5: apply transitions, checking the predicate on every
        // overlapping old state first.
        let mut predicate_cache: HashMap<Address, Vec<u8>> = HashMap::new();
        for t in &transactions_with_bounds {
            for old_state in post_state.get_old_states(t.new_state()) {
                let bytecode = self.predicate_bytecode(&mut predicate_cache, old_state.predicate()).await?;
                let ok = self
                    .contract_client
                    .valid_state_transition(
                        &bytecode,
                        &old_state.encoded(),
                        &t.new_state().encoded(),
                        t.witness(),
                    )
                    .await?;
                if !ok {
                    return Err(ProofError::InvalidTransition);
                }
            }
            post_state.apply_transition(t)?;
        }

        // Step 6: confirm target.
        if !post_state.has_state_object(tx.new_state()) {
            return Err(ProofError::InvalidTransition);
        }

        Ok(post_state)
    }

    /// Write-through predicate bytecode cache: in-memory (this call only),
    /// backed by ChainStore, falling back to the anchor chain and
    /// persisting what it fetches. Never evicts within a single `verify`.
    async fn predicate_bytecode(
        &self,
        cache: &mut HashMap<Address, Vec<u8>>,
        predicate: Address,
    ) -> Result<Vec<u8>, ProofError> {
        if let Some(bytecode) = cache.get(&predicate) {
            return Ok(bytecode.clone());
        }
        if let Some(bytecode) = self.chain_store.get_predicate_bytecode(predicate)? {
            cache.insert(predicate, bytecode.clone());
            return Ok(bytecode);
        }
        let bytecode = self
            .anchor_client
            .get_predicate_bytecode(predicate.as_bytes())
            .await?;
        if bytecode.is_empty() {
            return Err(ProofError::UnknownPredicate(predicate.to_string()));
        }
        self.chain_store.put_predicate_bytecode(predicate, &bytecode)?;
        cache.insert(predicate, bytecode.clone());
        Ok(bytecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangechain_client_traits::{MockAnchorClient, MockContractClient};
    use rangechain_primitives::{keccak256, BigAmount, Hash32};

    fn obj(start: u64, end: u64, block: u64, predicate: Address, state: Vec<u8>) -> StateObject {
        StateObject::new(
            BigAmount::from_u64(start),
            BigAmount::from_u64(end),
            BigAmount::from_u64(block),
            predicate,
            state,
        )
        .unwrap()
    }

    fn single_leaf_root(leaf_encoded: &[u8], sum: u64) -> Hash32 {
        use rangechain_primitives::abi_encode;
        let leaf_hash = keccak256(leaf_encoded);
        keccak256(&abi_encode(&[
            leaf_hash.as_bytes().as_slice(),
            &BigAmount::from_u64(sum).to_bytes_be(),
        ]))
    }

    #[tokio::test]
    async fn valid_transition_over_an_existing_deposit_succeeds() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let predicate = Address::new([2; 20]);
        let old_state = obj(0, 10, 1, predicate, vec![1]);
        let new_state = obj(0, 10, 2, predicate, vec![2]);
        let root = single_leaf_root(&new_state.encoded(), 10);
        chain_store.put_block_header(2, root).unwrap();
        chain_store
            .put_predicate_bytecode(predicate, b"bytecode")
            .unwrap();

        let mut anchor = MockAnchorClient::new();
        anchor.expect_deposit_valid().returning(|_| Ok(true));
        let mut contract = MockContractClient::new();
        contract
            .expect_valid_state_transition()
            .returning(|_, _, _, _| Ok(true));

        let verifier = ProofVerifier::new(
            chain_store,
            Arc::new(anchor),
            Arc::new(contract),
            Arc::new(crate::sumtree::BinarySumTree),
        );

        let tx = Transaction::new(2, vec![], vec![], new_state.clone());
        let proof = TransactionProof::new(vec![old_state.clone()], vec![tx.clone()]).unwrap();

        let post_state = verifier.verify(&tx, proof).await.unwrap();
        assert!(post_state.has_state_object(&new_state));
    }

    #[tokio::test]
    async fn verifying_the_same_proof_twice_yields_equal_post_states() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let predicate = Address::new([2; 20]);
        let old_state = obj(0, 10, 1, predicate, vec![1]);
        let new_state = obj(0, 10, 2, predicate, vec![2]);
        let root = single_leaf_root(&new_state.encoded(), 10);
        chain_store.put_block_header(2, root).unwrap();
        chain_store
            .put_predicate_bytecode(predicate, b"bytecode")
            .unwrap();

        let mut anchor = MockAnchorClient::new();
        anchor.expect_deposit_valid().returning(|_| Ok(true));
        let mut contract = MockContractClient::new();
        contract
            .expect_valid_state_transition()
            .returning(|_, _, _, _| Ok(true));

        let verifier = ProofVerifier::new(
            chain_store,
            Arc::new(anchor),
            Arc::new(contract),
            Arc::new(crate::sumtree::BinarySumTree),
        );

        let tx = Transaction::new(2, vec![], vec![], new_state.clone());
        let proof = TransactionProof::new(vec![old_state.clone()], vec![tx.clone()]).unwrap();

        let first = verifier.verify(&tx, proof.clone()).await.unwrap();
        let second = verifier.verify(&tx, proof).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn predicate_rejection_fails_with_invalid_transition() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let predicate = Address::new([3; 20]);
        let old_state = obj(0, 10, 1, predicate, vec![1]);
        let new_state = obj(0, 10, 2, predicate, vec![2]);
        let root = single_leaf_root(&new_state.encoded(), 10);
        chain_store.put_block_header(2, root).unwrap();
        chain_store
            .put_predicate_bytecode(predicate, b"bytecode")
            .unwrap();

        let mut anchor = MockAnchorClient::new();
        anchor.expect_deposit_valid().returning(|_| Ok(true));
        let mut contract = MockContractClient::new();
        contract
            .expect_valid_state_transition()
            .returning(|_, _, _, _| Ok(false));

        let verifier = ProofVerifier::new(
            chain_store,
            Arc::new(anchor),
            Arc::new(contract),
            Arc::new(crate::sumtree::BinarySumTree),
        );

        let tx = Transaction::new(2, vec![], vec![], new_state.clone());
        let proof = TransactionProof::new(vec![old_state.clone()], vec![tx.clone()]).unwrap();

        let err = verifier.verify(&tx, proof).await.unwrap_err();
        assert!(matches!(err, ProofError::InvalidTransition));
    }

    #[tokio::test]
    async fn invalid_deposit_short_circuits_before_touching_chain_store() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let mut anchor = MockAnchorClient::new();
        anchor.expect_deposit_valid().returning(|_| Ok(false));
        let contract = MockContractClient::new();

        let verifier = ProofVerifier::new(
            chain_store,
            Arc::new(anchor),
            Arc::new(contract),
            Arc::new(crate::sumtree::BinarySumTree),
        );

        let deposit = obj(0, 10, 1, Address::new([1; 20]), vec![]);
        let tx = Transaction::new(1, vec![], vec![], deposit.clone());
        let proof = TransactionProof::new(vec![deposit], vec![]).unwrap();

        let err = verifier.verify(&tx, proof).await.unwrap_err();
        assert!(matches!(err, ProofError::InvalidDeposit));
    }

    #[tokio::test]
    async fn missing_block_header_fails_with_missing_block_root() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let mut anchor = MockAnchorClient::new();
        anchor.expect_deposit_valid().returning(|_| Ok(true));
        let contract = MockContractClient::new();

        let verifier = ProofVerifier::new(
            chain_store,
            Arc::new(anchor),
            Arc::new(contract),
            Arc::new(crate::sumtree::BinarySumTree),
        );

        let new_state = obj(0, 10, 1, Address::new([1; 20]), vec![]);
        let tx = Transaction::new(1, vec![], vec![], new_state.clone());
        let proof = TransactionProof::new(vec![], vec![tx.clone()]).unwrap();

        let err = verifier.verify(&tx, proof).await.unwrap_err();
        assert!(matches!(err, ProofError::MissingBlockRoot(1)));
    }

    #[tokio::test]
    async fn deposit_only_proof_yields_post_state_containing_the_deposit() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let mut anchor = MockAnchorClient::new();
        anchor.expect_deposit_valid().returning(|_| Ok(true));
        let contract = MockContractClient::new();

        let verifier = ProofVerifier::new(
            chain_store,
            Arc::new(anchor),
            Arc::new(contract),
            Arc::new(crate::sumtree::BinarySumTree),
        );

        let deposit = obj(0, 10, 1, Address::new([1; 20]), vec![]);
        // target tx must equal some state object the post-state ends up with;
        // here we target the deposit itself (a no-op "transition").
        let tx = Transaction::new(1, vec![], vec![], deposit.clone());
        let proof = TransactionProof::new(vec![deposit.clone()], vec![]).unwrap();

        let post_state = verifier.verify(&tx, proof).await.unwrap();
        assert!(post_state.has_state_object(&deposit));
    }

    #[tokio::test]
    async fn unverifiable_inclusion_proof_fails_with_invalid_inclusion() {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        chain_store
            .put_block_header(1, Hash32::new([9; 32]))
            .unwrap();
        let mut anchor = MockAnchorClient::new();
        anchor.expect_deposit_valid().returning(|_| Ok(true));
        let contract = MockContractClient::new();

        let verifier = ProofVerifier::new(
            chain_store,
            Arc::new(anchor),
            Arc::new(contract),
            Arc::new(crate::sumtree::BinarySumTree),
        );

        let new_state = obj(0, 10, 1, Address::new([1; 20]), vec![]);
        let tx = Transaction::new(1, vec![], vec![], new_state.clone());
        let proof = TransactionProof::new(vec![], vec![tx.clone()]).unwrap();

        let err = verifier.verify(&tx, proof).await.unwrap_err();
        assert!(matches!(err, ProofError::InvalidInclusion));
    }
}
