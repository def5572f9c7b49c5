use rangechain_primitives::{abi_encode, Address, BigAmount};
use rangechain_range_store::RangeEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateObjectError {
    #[error("invalid bounds: start {start} >= end {end}")]
    InvalidBounds { start: String, end: String },
    #[error("implicit bounds must satisfy implicitStart <= start <= end <= implicitEnd")]
    InvalidImplicitBounds,
}

/// A unit of state over `[start, end)` of the coin-space, owned (in the
/// predicate sense) by `predicate`, carrying opaque `state` bytes.
///
/// Equality is pointwise over the five *core* fields only (`start`, `end`,
/// `block`, `predicate`, `state`) — the optional implicit bounds are proof
/// metadata, not part of the object's identity, per spec.md §3.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateObject {
    start: BigAmount,
    end: BigAmount,
    block: BigAmount,
    predicate: Address,
    state: Vec<u8>,
    implicit_start: Option<BigAmount>,
    implicit_end: Option<BigAmount>,
}

impl StateObject {
    pub fn new(
        start: BigAmount,
        end: BigAmount,
        block: BigAmount,
        predicate: Address,
        state: Vec<u8>,
    ) -> Result<Self, StateObjectError> {
        if start >= end {
            return Err(StateObjectError::InvalidBounds {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            start,
            end,
            block,
            predicate,
            state,
            implicit_start: None,
            implicit_end: None,
        })
    }

    pub fn with_implicit_bounds(
        mut self,
        implicit_start: BigAmount,
        implicit_end: BigAmount,
    ) -> Result<Self, StateObjectError> {
        if implicit_start > self.start || self.end > implicit_end {
            return Err(StateObjectError::InvalidImplicitBounds);
        }
        self.implicit_start = Some(implicit_start);
        self.implicit_end = Some(implicit_end);
        Ok(self)
    }

    pub fn start(&self) -> &BigAmount {
        &self.start
    }

    pub fn end(&self) -> &BigAmount {
        &self.end
    }

    pub fn block(&self) -> &BigAmount {
        &self.block
    }

    pub fn predicate(&self) -> Address {
        self.predicate
    }

    pub fn state(&self) -> &[u8] {
        &self.state
    }

    pub fn implicit_start(&self) -> Option<&BigAmount> {
        self.implicit_start.as_ref()
    }

    pub fn implicit_end(&self) -> Option<&BigAmount> {
        self.implicit_end.as_ref()
    }

    /// The owner address, under the ownership-predicate convention that
    /// the first 20 bytes of `state` hold it (see `DESIGN.md`). `None` if
    /// `state` is too short to carry an address.
    pub fn owner(&self) -> Option<Address> {
        self.state
            .get(0..20)
            .and_then(|bytes| Address::try_from(bytes).ok())
    }

    /// A canonical byte encoding of this object, used as the `newState`
    /// component of a `Transaction`'s hash preimage.
    pub fn encoded(&self) -> Vec<u8> {
        abi_encode(&[
            &self.start.to_bytes_be(),
            &self.end.to_bytes_be(),
            &self.block.to_bytes_be(),
            self.predicate.as_bytes(),
            &self.state,
        ])
    }
}

/// Equality is pointwise over the five core fields only.
impl PartialEq for StateObject {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.block == other.block
            && self.predicate == other.predicate
            && self.state == other.state
    }
}
impl Eq for StateObject {}

impl RangeEntry for StateObject {
    fn start(&self) -> BigAmount {
        self.start.clone()
    }

    fn end(&self) -> BigAmount {
        self.end.clone()
    }

    fn block(&self) -> BigAmount {
        self.block.clone()
    }

    fn with_bounds(&self, start: BigAmount, end: BigAmount) -> Self {
        Self {
            start,
            end,
            block: self.block.clone(),
            predicate: self.predicate,
            state: self.state.clone(),
            implicit_start: None,
            implicit_end: None,
        }
    }

    fn with_block(&self, block: BigAmount) -> Self {
        Self {
            block,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = StateObject::new(
            BigAmount::from_u64(10),
            BigAmount::from_u64(10),
            BigAmount::from_u64(0),
            addr(1),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, StateObjectError::InvalidBounds { .. }));
    }

    #[test]
    fn equality_ignores_implicit_bounds() {
        let a = StateObject::new(
            BigAmount::from_u64(0),
            BigAmount::from_u64(100),
            BigAmount::from_u64(1),
            addr(1),
            vec![1, 2, 3],
        )
        .unwrap();
        let b = a
            .clone()
            .with_implicit_bounds(BigAmount::from_u64(0), BigAmount::from_u64(200))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn implicit_bounds_must_contain_explicit_bounds() {
        let a = StateObject::new(
            BigAmount::from_u64(30),
            BigAmount::from_u64(70),
            BigAmount::from_u64(1),
            addr(1),
            vec![],
        )
        .unwrap();
        assert!(a
            .with_implicit_bounds(BigAmount::from_u64(40), BigAmount::from_u64(70))
            .is_err());
    }

    #[test]
    fn owner_reads_first_twenty_bytes_of_state() {
        let mut state = vec![7u8; 20];
        state.extend_from_slice(b"extra-predicate-params");
        let obj = StateObject::new(
            BigAmount::from_u64(0),
            BigAmount::from_u64(1),
            BigAmount::from_u64(0),
            addr(1),
            state,
        )
        .unwrap();
        assert_eq!(obj.owner(), Some(addr(7)));
    }
}
