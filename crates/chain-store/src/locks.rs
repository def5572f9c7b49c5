use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

/// A table of named async mutexes, handed out on demand.
///
/// Guards multi-step read-modify-write sequences against a single logical
/// key (`"latestblock"`, `"state"`, `exits:{owner}`) without needing one
/// lock per namespace wired up ahead of time, per spec.md §4.D/§4.H.
#[derive(Default)]
pub struct NamedLockTable {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl NamedLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: impl Into<String>) -> Arc<AsyncMutex<()>> {
        let name = name.into();
        let mut locks = self.locks.lock().unwrap();
        locks.entry(name).or_default().clone()
    }
}
