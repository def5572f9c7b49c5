//! Finality-delayed, deduplicated polling of an anchor chain (spec.md §4.F).

mod error;
mod listener;
mod watcher;

pub use error::EventWatcherError;
pub use listener::EventListener;
pub use watcher::EventWatcher;
