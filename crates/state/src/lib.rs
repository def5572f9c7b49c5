//! The range-partitioned state engine: `StateObject`, `Transaction`,
//! `TransactionProof`, and the `SnapshotManager` that applies deposits and
//! transitions to a [`rangechain_range_store::RangeStore`].

mod exit;
mod object;
mod snapshot;
mod transaction;

pub use exit::Exit;
pub use object::{StateObject, StateObjectError};
pub use snapshot::SnapshotManager;
pub use transaction::{Transaction, TransactionProof};
