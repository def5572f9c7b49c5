use rangechain_primitives::{abi_encode, keccak256, Hash32};
use std::collections::BTreeMap;

/// A raw anchor-chain log entry, as returned by [`crate::AnchorClient::get_events`].
///
/// `return_values` holds the event's ABI-decoded named fields as raw bytes;
/// mapping them into domain events (`Deposit`, `BlockSubmitted`, ...) is
/// `rangechain-sync`'s job, not this trait's (spec.md §4.F/§4.G).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorEvent {
    pub name: String,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: Hash32,
    pub return_values: BTreeMap<String, Vec<u8>>,
}

impl AnchorEvent {
    /// Identity used to dedupe an event across re-orgs and re-polls:
    /// `keccak256(transactionHash ‖ logIndex)`.
    pub fn identity(&self) -> Hash32 {
        let encoded = abi_encode(&[
            self.transaction_hash.as_bytes().as_slice(),
            &self.log_index.to_be_bytes(),
        ]);
        keccak256(&encoded)
    }
}
