//! Cross-cutting value types shared by every `rangechain-*` crate.
//!
//! Coin positions, block numbers, token ids and amounts are all modeled as
//! non-negative arbitrary-precision integers (see [`BigAmount`]) rather than
//! fixed-width machine integers, because the coin-space this client tracks
//! is sparse and unbounded.

mod abi;
mod address;
mod amount;
mod coinspace;
mod hash;
mod typed_value;

pub use abi::{abi_decode, abi_encode};
pub use address::Address;
pub use amount::{ArithmeticError, BigAmount};
pub use coinspace::token_of;
pub use hash::{keccak256, Hash32};
pub use typed_value::typed_value;
