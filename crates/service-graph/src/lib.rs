//! A named registry of cooperating services with an explicit dependency
//! DAG, failure-aware topological startup, and mutual service discovery
//! (spec.md §4.I).

mod error;
mod graph;
mod name;
mod service;

pub use error::ServiceGraphError;
pub use graph::{LifecycleEvent, ServiceGraph};
pub use name::ServiceName;
pub use service::Service;
