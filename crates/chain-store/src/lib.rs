//! Sled-backed persistence: `ChainStore` (spec.md §4.D), `SyncCursorStore`
//! (§4.E), and the `NamedLockTable` both share for multi-step
//! read-modify-write sequences.

mod cursor;
mod error;
mod locks;
mod store;

pub use cursor::SyncCursorStore;
pub use error::StorageError;
pub use locks::NamedLockTable;
pub use store::ChainStore;
