//! Trait-per-capability external collaborators (spec.md §9 Design Notes):
//! `AnchorClient`, `OperatorClient`, `WalletSigner`, `ContractClient`.
//!
//! None of these traits talk to a real chain or HTTP endpoint — that
//! transport plumbing is explicitly out of scope (spec.md §1 Non-goals).
//! Each trait is `#[async_trait]` (except the synchronous `WalletSigner`)
//! so a caller can depend on the capability it actually needs rather than
//! one monolithic "node" interface, matching
//! `crates/alpen-ee/common/src/traits/*` in the teacher.

mod anchor;
mod contract;
mod event;
mod operator;
mod wallet;

#[cfg(feature = "test-utils")]
pub mod in_memory;

pub use anchor::{AnchorClient, AnchorClientError};
pub use contract::{ContractClient, ContractClientError};
pub use event::AnchorEvent;
pub use operator::{OperatorClient, OperatorClientError};
pub use wallet::{WalletSigner, WalletSignerError};

#[cfg(feature = "test-utils")]
pub use anchor::MockAnchorClient;
#[cfg(feature = "test-utils")]
pub use contract::MockContractClient;
#[cfg(feature = "test-utils")]
pub use operator::MockOperatorClient;
#[cfg(feature = "test-utils")]
pub use wallet::MockWalletSigner;
