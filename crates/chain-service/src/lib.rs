//! `ChainService`: the public façade over head state, exits and
//! transactions (spec.md §4.H).

mod error;
mod service;

pub use error::ChainServiceError;
pub use service::ChainService;
