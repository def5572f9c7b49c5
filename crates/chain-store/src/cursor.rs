use std::path::Path;
#[cfg(test)]
use std::collections::HashSet;

use rangechain_primitives::Hash32;

use crate::error::StorageError;

/// Per-event-name sync progress: the highest anchor block processed, the
/// set of anchor-event identities already seen, and a retry queue of
/// encoded transactions that failed to import (spec.md §4.E).
///
/// `add_events`/`has_event` must satisfy: `has_event(e)` is true iff `e`
/// was ever passed to `add_events`, and `add_events` is idempotent —
/// re-adding an already-seen identity is a no-op, not a duplicate entry.
pub struct SyncCursorStore {
    last_logged: sled::Tree,
    seen_events: sled::Tree,
    failed_transactions: sled::Tree,
    meta: sled::Tree,
}

const LAST_SYNCED_BLOCK_KEY: &[u8] = b"last_synced_block";

impl SyncCursorStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(&db)
    }

    fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            last_logged: db.open_tree("cursor_last_logged")?,
            seen_events: db.open_tree("cursor_seen_events")?,
            failed_transactions: db.open_tree("cursor_failed_tx")?,
            meta: db.open_tree("cursor_meta")?,
        })
    }

    /// The last local block the wallet-sync pipeline has fully processed,
    /// distinct from the per-event-name cursor `EventWatcher` advances.
    pub fn get_last_synced_block(&self) -> Result<u64, StorageError> {
        match self.meta.get(LAST_SYNCED_BLOCK_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| StorageError::invariant_violated("corrupt sync cursor length"))?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_last_synced_block(&self, block: u64) -> Result<(), StorageError> {
        self.meta.insert(LAST_SYNCED_BLOCK_KEY, &block.to_be_bytes())?;
        Ok(())
    }

    pub fn get_last_logged_event_block(&self, event_name: &str) -> Result<u64, StorageError> {
        match self.last_logged.get(event_name)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| StorageError::invariant_violated("corrupt cursor length"))?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_last_logged_event_block(
        &self,
        event_name: &str,
        block: u64,
    ) -> Result<(), StorageError> {
        self.last_logged.insert(event_name, &block.to_be_bytes())?;
        Ok(())
    }

    pub fn has_event(&self, identity: Hash32) -> Result<bool, StorageError> {
        Ok(self.seen_events.contains_key(identity.as_bytes())?)
    }

    /// Idempotent: identities already present are skipped, not re-added.
    pub fn add_events(&self, identities: &[Hash32]) -> Result<(), StorageError> {
        for identity in identities {
            self.seen_events.insert(identity.as_bytes(), &[1u8])?;
        }
        Ok(())
    }

    pub fn queue_failed_transaction(&self, encoded_tx: Vec<u8>) -> Result<(), StorageError> {
        // NOTE: not safe against concurrent callers; the sync pipeline only
        // ever queues from its own single task.
        let next_idx = self.failed_transactions.len() as u64;
        self.failed_transactions
            .insert(next_idx.to_be_bytes(), encoded_tx)?;
        Ok(())
    }

    pub fn failed_transactions(&self) -> Result<Vec<Vec<u8>>, StorageError> {
        let mut out = Vec::new();
        for entry in self.failed_transactions.iter() {
            let (_, value) = entry?;
            out.push(value.to_vec());
        }
        Ok(out)
    }

    pub fn clear_failed_transactions(&self) -> Result<(), StorageError> {
        self.failed_transactions.clear()?;
        Ok(())
    }

    /// The distinct identities currently marked seen, for diagnostics/tests.
    pub fn seen_event_count(&self) -> Result<usize, StorageError> {
        Ok(self.seen_events.len())
    }

    #[cfg(test)]
    fn seen_events_snapshot(&self) -> Result<HashSet<Vec<u8>>, StorageError> {
        let mut out = HashSet::new();
        for entry in self.seen_events.iter() {
            let (key, _) = entry?;
            out.insert(key.to_vec());
        }
        Ok(out)
    }
}
