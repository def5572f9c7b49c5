use std::path::Path;

use rangechain_primitives::{abi_encode, typed_value, Address, BigAmount, Hash32};
use rangechain_state::{Exit, StateObject, Transaction};
use tracing::instrument;

use crate::error::StorageError;
use crate::locks::NamedLockTable;

/// Sled-tree-per-namespace persistence layer, one tree per row of the
/// namespace table in spec.md §4.D. Generalizes the teacher's
/// `typed-sled`/`strata-db-store-sled` "typed wrapper over sled trees"
/// idiom to a direct `sled::Db`, so an in-memory (`temporary`) sled
/// instance can back unit tests without a throwaway directory on disk.
pub struct ChainStore {
    transactions: sled::Tree,
    headers: sled::Tree,
    meta: sled::Tree,
    exits: sled::Tree,
    exited: sled::Tree,
    finalized: sled::Tree,
    exitable: sled::Tree,
    state_latest: sled::Tree,
    predicates: sled::Tree,
    locks: NamedLockTable,
}

const STATE_LATEST_KEY: &[u8] = b"state:latest";
const LATEST_BLOCK_KEY: &[u8] = b"latestblock";

impl ChainStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A temporary, disk-backed sled instance cleaned up on drop. Used by
    /// tests and by anything that does not need durability across restarts.
    pub fn in_memory() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            transactions: db.open_tree("transaction")?,
            headers: db.open_tree("header")?,
            meta: db.open_tree("meta")?,
            exits: db.open_tree("exits")?,
            exited: db.open_tree("exited")?,
            finalized: db.open_tree("finalized")?,
            exitable: db.open_tree("exitable")?,
            state_latest: db.open_tree("state_latest")?,
            predicates: db.open_tree("predicate")?,
            locks: NamedLockTable::new(),
        })
    }

    /// Idempotent: re-putting the same hash with identical bytes is a no-op.
    #[instrument(skip(self, tx))]
    pub fn put_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let key = tx.hash();
        let encoded = bincode::serialize(tx)?;
        self.transactions.insert(key.as_bytes(), encoded)?;
        Ok(())
    }

    pub fn get_transaction(&self, hash: Hash32) -> Result<Option<Transaction>, StorageError> {
        match self.transactions.get(hash.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Immutable after first write: rewriting the same block with a
    /// different root is an invariant violation, not silently accepted.
    #[instrument(skip(self))]
    pub fn put_block_header(&self, block: u64, root: Hash32) -> Result<(), StorageError> {
        let key = block.to_be_bytes();
        if let Some(existing) = self.headers.get(key)? {
            if existing.as_ref() != root.as_bytes() {
                return Err(StorageError::invariant_violated(format!(
                    "block {block} header already set to a different root"
                )));
            }
            return Ok(());
        }
        self.headers.insert(key, root.as_bytes().to_vec())?;
        Ok(())
    }

    pub fn get_block_header(&self, block: u64) -> Result<Option<Hash32>, StorageError> {
        match self.headers.get(block.to_be_bytes())? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes.as_ref().try_into().map_err(|_| {
                    StorageError::invariant_violated("corrupt block header length")
                })?;
                Ok(Some(Hash32::new(arr)))
            }
            None => Ok(None),
        }
    }

    pub async fn latest_block(&self) -> Result<u64, StorageError> {
        match self.meta.get(LATEST_BLOCK_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| StorageError::invariant_violated("corrupt latestblock length"))?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    /// Monotonic: refuses to move `latestblock` backwards.
    #[instrument(skip(self))]
    pub async fn set_latest_block(&self, block: u64) -> Result<(), StorageError> {
        let lock = self.locks.get(LATEST_BLOCK_KEY);
        let _guard = lock.lock().await;
        let current = self.latest_block().await?;
        if block < current {
            return Err(StorageError::invariant_violated(format!(
                "refusing to move latestblock backwards: {current} -> {block}"
            )));
        }
        self.meta.insert(LATEST_BLOCK_KEY, &block.to_be_bytes())?;
        Ok(())
    }

    /// Appends `exit` to `owner`'s exit list, serialised by a lock keyed on
    /// that owner so concurrent appends never clobber each other.
    #[instrument(skip(self, exit))]
    pub async fn append_exit(&self, exit: &Exit) -> Result<(), StorageError> {
        let lock_name = format!("exits:{}", exit.owner);
        let lock = self.locks.get(lock_name);
        let _guard = lock.lock().await;

        let mut exits = self.get_exits(exit.owner)?;
        exits.push(exit.clone());
        let encoded = bincode::serialize(&exits)?;
        self.exits.insert(exit.owner.as_bytes(), encoded)?;
        Ok(())
    }

    /// `owner`'s exits, with `finalized` resolved from the separate
    /// `finalized:{token}:{start}:{end}` mark — the raw append-only
    /// `exits:{owner}` record itself never has that field mutated once
    /// written, per spec.md §3 ("finalised is a persisted mark", kept
    /// apart from the exit-started record it marks).
    pub fn get_exits(&self, owner: Address) -> Result<Vec<Exit>, StorageError> {
        let raw: Vec<Exit> = match self.exits.get(owner.as_bytes())? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => Vec::new(),
        };
        raw.into_iter()
            .map(|mut exit| {
                exit.finalized = self.is_finalized(&exit.token, &exit.start, &exit.end)?;
                Ok(exit)
            })
            .collect()
    }

    fn range_key(token: &BigAmount, start: &BigAmount, end: &BigAmount) -> Vec<u8> {
        abi_encode(&[&token.to_bytes_be(), &start.to_bytes_be(), &end.to_bytes_be()])
    }

    pub fn mark_exited(
        &self,
        token: &BigAmount,
        start: &BigAmount,
        end: &BigAmount,
    ) -> Result<(), StorageError> {
        self.exited.insert(Self::range_key(token, start, end), &[1u8])?;
        Ok(())
    }

    pub fn is_exited(
        &self,
        token: &BigAmount,
        start: &BigAmount,
        end: &BigAmount,
    ) -> Result<bool, StorageError> {
        Ok(self.exited.contains_key(Self::range_key(token, start, end))?)
    }

    pub fn mark_finalized(
        &self,
        token: &BigAmount,
        start: &BigAmount,
        end: &BigAmount,
    ) -> Result<(), StorageError> {
        self.finalized.insert(Self::range_key(token, start, end), &[1u8])?;
        Ok(())
    }

    pub fn is_finalized(
        &self,
        token: &BigAmount,
        start: &BigAmount,
        end: &BigAmount,
    ) -> Result<bool, StorageError> {
        Ok(self.finalized.contains_key(Self::range_key(token, start, end))?)
    }

    /// Records `end` as an exitable frontier for `token`, keyed by
    /// `typedValue(token, end)` so the tree naturally sorts first by token,
    /// then by value.
    pub fn add_exitable_end(&self, token: &BigAmount, end: &BigAmount) -> Result<(), StorageError> {
        let key = typed_value(token, end)
            .map_err(|e| StorageError::invariant_violated(e.to_string()))?;
        self.exitable.insert(key, end.to_bytes_be())?;
        Ok(())
    }

    /// Key-space "next key with prefix" scan: the smallest recorded
    /// exitable end for `token` that is `>= end`, or `None` if the token
    /// has no recorded frontier at or beyond `end`.
    pub fn get_exitable_end(
        &self,
        token: &BigAmount,
        end: &BigAmount,
    ) -> Result<Option<BigAmount>, StorageError> {
        let start_key = typed_value(token, end)
            .map_err(|e| StorageError::invariant_violated(e.to_string()))?;
        let token_prefix = &start_key[0..8];

        for entry in self.exitable.range(start_key.to_vec()..) {
            let (key, value) = entry?;
            if &key[0..8] != token_prefix {
                return Ok(None);
            }
            return Ok(Some(BigAmount::from_bytes_be(&value)));
        }
        Ok(None)
    }

    pub fn get_state_latest(&self) -> Result<Vec<StateObject>, StorageError> {
        match self.state_latest.get(STATE_LATEST_KEY)? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn set_state_latest(&self, objects: &[StateObject]) -> Result<(), StorageError> {
        let encoded = bincode::serialize(objects)?;
        self.state_latest.insert(STATE_LATEST_KEY, encoded)?;
        Ok(())
    }

    /// Named lock guarding read-modify-write of `state:latest` (the "state"
    /// lock referenced throughout spec.md §4.H).
    pub fn state_lock(&self) -> std::sync::Arc<tokio::sync::Mutex<()>> {
        self.locks.get("state")
    }

    pub fn get_predicate_bytecode(&self, predicate: Address) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .predicates
            .get(predicate.as_bytes())?
            .map(|bytes| bytes.to_vec()))
    }

    pub fn put_predicate_bytecode(
        &self,
        predicate: Address,
        bytecode: &[u8],
    ) -> Result<(), StorageError> {
        self.predicates.insert(predicate.as_bytes(), bytecode)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangechain_primitives::Hash32;
    use rangechain_state::StateObject;

    fn store() -> ChainStore {
        ChainStore::in_memory().unwrap()
    }

    #[test]
    fn block_header_is_immutable_after_first_write() {
        let store = store();
        store.put_block_header(1, Hash32::new([1; 32])).unwrap();
        assert!(store.put_block_header(1, Hash32::new([1; 32])).is_ok());
        assert!(store.put_block_header(1, Hash32::new([2; 32])).is_err());
    }

    #[tokio::test]
    async fn latest_block_refuses_to_go_backwards() {
        let store = store();
        store.set_latest_block(10).await.unwrap();
        assert!(store.set_latest_block(5).await.is_err());
        store.set_latest_block(10).await.unwrap();
        store.set_latest_block(11).await.unwrap();
    }

    #[tokio::test]
    async fn exits_append_only() {
        let store = store();
        let owner = Address::new([1; 20]);
        let exit1 = Exit::new(
            Hash32::new([1; 32]),
            owner,
            BigAmount::zero(),
            BigAmount::from_u64(0),
            BigAmount::from_u64(10),
            1,
        );
        let exit2 = Exit::new(
            Hash32::new([2; 32]),
            owner,
            BigAmount::zero(),
            BigAmount::from_u64(10),
            BigAmount::from_u64(20),
            2,
        );
        store.append_exit(&exit1).await.unwrap();
        store.append_exit(&exit2).await.unwrap();
        assert_eq!(store.get_exits(owner).unwrap(), vec![exit1, exit2]);
    }

    #[tokio::test]
    async fn get_exits_resolves_finalized_from_the_separate_mark() {
        let store = store();
        let owner = Address::new([2; 20]);
        let exit = Exit::new(
            Hash32::new([3; 32]),
            owner,
            BigAmount::zero(),
            BigAmount::from_u64(0),
            BigAmount::from_u64(10),
            1,
        );
        store.append_exit(&exit).await.unwrap();

        assert!(!store.get_exits(owner).unwrap()[0].finalized);

        store
            .mark_finalized(&exit.token, &exit.start, &exit.end)
            .unwrap();

        let exits = store.get_exits(owner).unwrap();
        assert_eq!(exits.len(), 1);
        assert!(exits[0].finalized);
    }

    #[test]
    fn exitable_end_scan_finds_next_within_token() {
        let store = store();
        let token = BigAmount::from_u64(7);
        store.add_exitable_end(&token, &BigAmount::from_u64(50)).unwrap();
        store.add_exitable_end(&token, &BigAmount::from_u64(100)).unwrap();

        let found = store
            .get_exitable_end(&token, &BigAmount::from_u64(60))
            .unwrap();
        assert_eq!(found, Some(BigAmount::from_u64(100)));
    }

    #[test]
    fn exitable_end_scan_does_not_cross_token_boundary() {
        let store = store();
        store
            .add_exitable_end(&BigAmount::from_u64(1), &BigAmount::from_u64(10))
            .unwrap();
        let found = store
            .get_exitable_end(&BigAmount::from_u64(2), &BigAmount::from_u64(5))
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn transaction_round_trips() {
        let store = store();
        let obj = StateObject::new(
            BigAmount::from_u64(0),
            BigAmount::from_u64(10),
            BigAmount::from_u64(1),
            Address::new([1; 20]),
            vec![],
        )
        .unwrap();
        let tx = Transaction::new(1, vec![], vec![], obj);
        store.put_transaction(&tx).unwrap();
        let fetched = store.get_transaction(tx.hash()).unwrap().unwrap();
        assert_eq!(fetched.hash(), tx.hash());
    }

    #[test]
    fn predicate_bytecode_is_write_through() {
        let store = store();
        let predicate = Address::new([4; 20]);
        assert_eq!(store.get_predicate_bytecode(predicate).unwrap(), None);
        store.put_predicate_bytecode(predicate, b"bytecode").unwrap();
        assert_eq!(
            store.get_predicate_bytecode(predicate).unwrap(),
            Some(b"bytecode".to_vec())
        );
    }
}
