use rangechain_primitives::{abi_encode, keccak256, Hash32};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object::StateObject;

/// A single state transition: the predicate witness and inclusion proof
/// needed to validate moving to `new_state`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    block: u64,
    inclusion_proof: Vec<Vec<u8>>,
    witness: Vec<u8>,
    new_state: StateObject,
}

impl Transaction {
    pub fn new(
        block: u64,
        inclusion_proof: Vec<Vec<u8>>,
        witness: Vec<u8>,
        new_state: StateObject,
    ) -> Self {
        Self {
            block,
            inclusion_proof,
            witness,
            new_state,
        }
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    pub fn inclusion_proof(&self) -> &[Vec<u8>] {
        &self.inclusion_proof
    }

    pub fn witness(&self) -> &[u8] {
        &self.witness
    }

    pub fn new_state(&self) -> &StateObject {
        &self.new_state
    }

    pub fn new_state_mut(&mut self) -> &mut StateObject {
        &mut self.new_state
    }

    /// `hash = keccak256(abiEncode(block, inclusionProof, witness, newState.encoded))`.
    pub fn hash(&self) -> Hash32 {
        let proof_concat = abi_encode(
            &self
                .inclusion_proof
                .iter()
                .map(|p| p.as_slice())
                .collect::<Vec<_>>(),
        );
        let encoded = abi_encode(&[
            &self.block.to_be_bytes(),
            &proof_concat,
            &self.witness,
            &self.new_state.encoded(),
        ]);
        keccak256(&encoded)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionProofError {
    #[error("deposits must be ordered by start")]
    DepositsNotOrdered,
    #[error("transactions must be ordered by block")]
    TransactionsNotOrdered,
}

/// Deposits ordered by `start`, transactions ordered by `block`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionProof {
    deposits: Vec<StateObject>,
    transactions: Vec<Transaction>,
}

impl TransactionProof {
    pub fn new(
        deposits: Vec<StateObject>,
        transactions: Vec<Transaction>,
    ) -> Result<Self, TransactionProofError> {
        if !deposits.windows(2).all(|w| w[0].start() <= w[1].start()) {
            return Err(TransactionProofError::DepositsNotOrdered);
        }
        if !transactions.windows(2).all(|w| w[0].block() <= w[1].block()) {
            return Err(TransactionProofError::TransactionsNotOrdered);
        }
        Ok(Self {
            deposits,
            transactions,
        })
    }

    pub fn deposits(&self) -> &[StateObject] {
        &self.deposits
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transactions_mut(&mut self) -> &mut [Transaction] {
        &mut self.transactions
    }

    /// Consumes the proof, handing ownership of its deposits and
    /// transactions to the caller (used by `rangechain-proof-verifier` to
    /// rebuild transactions with their derived implicit bounds attached).
    pub fn into_parts(self) -> (Vec<StateObject>, Vec<Transaction>) {
        (self.deposits, self.transactions)
    }
}
