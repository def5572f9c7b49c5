use std::collections::BTreeMap;
use std::sync::Arc;

use rangechain_chain_store::ChainStore;
use rangechain_client_traits::{AnchorClient, OperatorClient};
use rangechain_primitives::{abi_encode, keccak256, token_of, Address, BigAmount, Hash32};
use rangechain_proof_verifier::ProofVerifier;
use rangechain_range_store::RangeEntry;
use rangechain_state::{Exit, SnapshotManager, StateObject, Transaction, TransactionProof};
use tracing::{debug, instrument};

use crate::error::ChainServiceError;

fn exit_id(owner: Address, token: &BigAmount, start: &BigAmount, end: &BigAmount, block: u64) -> Hash32 {
    let encoded = abi_encode(&[
        owner.as_bytes(),
        &token.to_bytes_be(),
        &start.to_bytes_be(),
        &end.to_bytes_be(),
        &block.to_be_bytes(),
    ]);
    keccak256(&encoded)
}

/// Orchestrates head-state mutations behind the `state` lock, plus the
/// exit lifecycle and coin selection, per spec.md §4.H.
///
/// One façade type wrapping a persisted table (`ChainStore`) plus external
/// collaborators (the proof verifier, anchor and operator clients),
/// matching the teacher's `BridgeV1State`/assignment bookkeeping shape —
/// a single type orchestrating a table, a lock, and an external clock.
pub struct ChainService {
    chain_store: Arc<ChainStore>,
    proof_verifier: Arc<ProofVerifier>,
    anchor_client: Arc<dyn AnchorClient>,
    operator_client: Arc<dyn OperatorClient>,
    token_segment_size: BigAmount,
    challenge_period: u64,
}

impl ChainService {
    pub fn new(
        chain_store: Arc<ChainStore>,
        proof_verifier: Arc<ProofVerifier>,
        anchor_client: Arc<dyn AnchorClient>,
        operator_client: Arc<dyn OperatorClient>,
        token_segment_size: BigAmount,
        challenge_period: u64,
    ) -> Self {
        Self {
            chain_store,
            proof_verifier,
            anchor_client,
            operator_client,
            token_segment_size,
            challenge_period,
        }
    }

    async fn load_head(&self) -> Result<SnapshotManager, ChainServiceError> {
        let mut manager = SnapshotManager::new();
        for object in self.chain_store.get_state_latest()? {
            manager.apply_deposit(object)?;
        }
        Ok(manager)
    }

    fn save_head(&self, manager: &SnapshotManager) -> Result<(), ChainServiceError> {
        self.chain_store.set_state_latest(manager.range_store().entries())?;
        Ok(())
    }

    /// Filters out deposits over an already-exited `(token, start, end)`,
    /// applies the survivors to head state under the `state` lock, then
    /// records their ends as exitable frontiers.
    #[instrument(skip(self, deposits))]
    pub async fn add_deposits(&self, deposits: Vec<StateObject>) -> Result<(), ChainServiceError> {
        let mut accepted = Vec::with_capacity(deposits.len());
        for deposit in deposits {
            let token = token_of(deposit.start(), &self.token_segment_size)?;
            if self.chain_store.is_exited(&token, deposit.start(), deposit.end())? {
                debug!(%token, start = %deposit.start(), end = %deposit.end(), "skipping deposit over an already-exited range");
                continue;
            }
            accepted.push((token, deposit));
        }

        let lock = self.chain_store.state_lock();
        let _guard = lock.lock().await;
        let mut manager = self.load_head().await?;
        for (_, deposit) in &accepted {
            manager.apply_deposit(deposit.clone())?;
        }
        self.save_head(&manager)?;

        for (token, deposit) in &accepted {
            self.chain_store.add_exitable_end(token, deposit.end())?;
        }
        Ok(())
    }

    /// Persists an exit and shrinks the covering head range under the
    /// `state` lock.
    #[instrument(skip(self))]
    pub async fn add_exit(
        &self,
        owner: Address,
        token: BigAmount,
        start: BigAmount,
        end: BigAmount,
        block: u64,
    ) -> Result<Exit, ChainServiceError> {
        let id = exit_id(owner, &token, &start, &end, block);
        let exit = Exit::new(id, owner, token.clone(), start.clone(), end.clone(), block);

        self.chain_store.mark_exited(&token, &start, &end)?;
        self.chain_store.append_exit(&exit).await?;

        let lock = self.chain_store.state_lock();
        let _guard = lock.lock().await;
        let mut manager = self.load_head().await?;
        manager.apply_exit(&start, &end);
        self.save_head(&manager)?;

        Ok(exit)
    }

    /// Finalizes every exit of `owner` whose challenge period has elapsed
    /// and which has not already been finalized, returning the anchor-chain
    /// receipt hash of each submitted `finalizeExit` call.
    #[instrument(skip(self))]
    pub async fn finalize_exits(&self, owner: Address) -> Result<Vec<Hash32>, ChainServiceError> {
        let current_anchor_block = self.anchor_client.head_height().await?;
        let mut receipts = Vec::new();

        for exit in self.chain_store.get_exits(owner)? {
            if !exit.is_completed(current_anchor_block, self.challenge_period) {
                continue;
            }
            if self.chain_store.is_finalized(&exit.token, &exit.start, &exit.end)? {
                continue;
            }
            let exitable_end = self
                .chain_store
                .get_exitable_end(&exit.token, &exit.end)?
                .ok_or_else(|| {
                    ChainServiceError::NotFound(format!(
                        "no exitable end recorded for token {} end {}",
                        exit.token, exit.end
                    ))
                })?;
            let receipt = self.anchor_client.finalize_exit(exit.id, &exitable_end, owner).await?;
            self.chain_store.mark_finalized(&exit.token, &exit.start, &exit.end)?;
            receipts.push(receipt);
        }
        Ok(receipts)
    }

    /// Verifies `tx` against `proof`, merges the resulting post-state into
    /// head state under the `state` lock, then persists `tx`.
    #[instrument(skip(self, tx, proof))]
    pub async fn add_transaction(
        &self,
        tx: Transaction,
        proof: TransactionProof,
    ) -> Result<(), ChainServiceError> {
        let post_state = self.proof_verifier.verify(&tx, proof).await?;

        let lock = self.chain_store.state_lock();
        let _guard = lock.lock().await;
        let mut manager = self.load_head().await?;
        manager.merge(&post_state);
        self.save_head(&manager)?;
        drop(_guard);

        self.chain_store.put_transaction(&tx)?;
        Ok(())
    }

    pub async fn send_transaction(&self, tx: Transaction) -> Result<(), ChainServiceError> {
        self.operator_client.send_transaction(tx).await?;
        Ok(())
    }

    pub async fn get_balances(&self, owner: Address) -> Result<BTreeMap<BigAmount, BigAmount>, ChainServiceError> {
        let manager = self.load_head().await?;
        Ok(manager.balances(owner, &self.token_segment_size)?)
    }

    pub async fn owned_ranges(&self, owner: Address) -> Result<Vec<StateObject>, ChainServiceError> {
        Ok(self.load_head().await?.owned_ranges(owner))
    }

    pub fn get_exits(&self, owner: Address) -> Result<Vec<Exit>, ChainServiceError> {
        Ok(self.chain_store.get_exits(owner)?)
    }

    /// Coin selection over `owner`'s ranges of `token` (spec.md §4.H
    /// Selection algorithm): ranges are sorted descending by size, then
    /// consumed smallest-first so small fragments are used up before
    /// larger ranges are split.
    #[instrument(skip(self))]
    pub async fn pick_ranges(
        &self,
        owner: Address,
        token: BigAmount,
        amount: BigAmount,
    ) -> Result<Vec<StateObject>, ChainServiceError> {
        let manager = self.load_head().await?;
        let mut candidates: Vec<StateObject> = manager
            .owned_ranges(owner)
            .into_iter()
            .filter(|r| {
                token_of(r.start(), &self.token_segment_size)
                    .map(|t| t == token)
                    .unwrap_or(false)
            })
            .collect();
        candidates.sort_by(|a, b| {
            let len_a = a.end().checked_sub(a.start()).expect("StateObject invariant guarantees end > start");
            let len_b = b.end().checked_sub(b.start()).expect("StateObject invariant guarantees end > start");
            len_b.cmp(&len_a)
        });

        let mut remaining = amount;
        let mut picked = Vec::new();
        while remaining > BigAmount::zero() {
            let Some(range) = candidates.pop() else {
                return Err(ChainServiceError::InsufficientBalance);
            };
            let len = range
                .end()
                .checked_sub(range.start())
                .expect("StateObject invariant guarantees end > start");
            if len <= remaining {
                remaining = remaining.checked_sub(&len)?;
                picked.push(range);
            } else {
                let prefix_end = range.start().checked_add(&remaining);
                picked.push(range.with_bounds(range.start().clone(), prefix_end));
                remaining = BigAmount::zero();
            }
        }

        picked.sort_by(|a, b| a.start().cmp(b.start()));
        Ok(picked)
    }
}
