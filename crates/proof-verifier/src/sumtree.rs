use rangechain_primitives::{abi_encode, keccak256, BigAmount, Hash32};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SumTreeError {
    #[error("malformed inclusion proof step")]
    MalformedStep,
    #[error("inclusion proof does not reach the expected root")]
    RootMismatch,
}

/// Inclusion-proof verifier for a binary Merkle sum tree over
/// `(amount, hash)` leaves, per spec.md §4.C step 2
/// (`PlasmaMerkleSumTree.getImplicitBounds`/inclusion check).
///
/// `rangechain-proof-verifier` does not hard-code a single implementation:
/// this trait is the seam, with [`BinarySumTree`] as the one reference
/// implementation a runnable core needs to pass its own seed tests.
pub trait SumTreeVerifier: Send + Sync {
    /// Derives `(implicitStart, implicitEnd)` for a leaf and verifies its
    /// inclusion proof against `root` in the same pass — the two are
    /// inseparable in a sum tree, since the bounds fall out of recomputing
    /// the path to the root.
    fn verify_and_get_implicit_bounds(
        &self,
        leaf_amount: &BigAmount,
        leaf_encoded: &[u8],
        inclusion_proof: &[Vec<u8>],
        root: Hash32,
    ) -> Result<(BigAmount, BigAmount), SumTreeError>;
}

/// One proof step: a sibling's `(sum, hash)` plus which side of the current
/// node it sits on.
struct Step {
    is_left: bool,
    sum: BigAmount,
    hash: Hash32,
}

fn decode_step(raw: &[u8]) -> Result<Step, SumTreeError> {
    // 1 byte side flag || 8 bytes BE sum || 32 bytes hash
    if raw.len() != 1 + 8 + 32 {
        return Err(SumTreeError::MalformedStep);
    }
    let is_left = raw[0] != 0;
    let sum = BigAmount::from_bytes_be(&raw[1..9]);
    let hash_bytes: [u8; 32] = raw[9..41].try_into().map_err(|_| SumTreeError::MalformedStep)?;
    Ok(Step {
        is_left,
        sum,
        hash: Hash32::new(hash_bytes),
    })
}

fn combine(left_hash: Hash32, left_sum: &BigAmount, right_hash: Hash32, right_sum: &BigAmount) -> Hash32 {
    let encoded = abi_encode(&[
        left_hash.as_bytes().as_slice(),
        &left_sum.to_bytes_be(),
        right_hash.as_bytes().as_slice(),
        &right_sum.to_bytes_be(),
    ]);
    keccak256(&encoded)
}

/// A simplified binary Merkle sum tree: each proof step carries its
/// sibling's `(sum, hash)` and a side flag; recomputing the path to the
/// root both verifies inclusion and recovers the leaf's implicit bounds
/// (the sum of all left siblings, and that plus the leaf's own weight).
#[derive(Debug, Default)]
pub struct BinarySumTree;

impl SumTreeVerifier for BinarySumTree {
    fn verify_and_get_implicit_bounds(
        &self,
        leaf_amount: &BigAmount,
        leaf_encoded: &[u8],
        inclusion_proof: &[Vec<u8>],
        root: Hash32,
    ) -> Result<(BigAmount, BigAmount), SumTreeError> {
        let mut current_hash = keccak256(leaf_encoded);
        let mut current_sum = leaf_amount.clone();
        let mut left_sum = BigAmount::zero();

        for raw_step in inclusion_proof {
            let step = decode_step(raw_step)?;
            current_hash = if step.is_left {
                left_sum = left_sum.checked_add(&step.sum);
                combine(step.hash, &step.sum, current_hash, &current_sum)
            } else {
                combine(current_hash, &current_sum, step.hash, &step.sum)
            };
            current_sum = current_sum.checked_add(&step.sum);
        }

        let expected_root = keccak256(&abi_encode(&[
            current_hash.as_bytes().as_slice(),
            &current_sum.to_bytes_be(),
        ]));
        if expected_root != root {
            return Err(SumTreeError::RootMismatch);
        }

        let implicit_start = left_sum;
        let implicit_end = implicit_start.checked_add(leaf_amount);
        Ok((implicit_start, implicit_end))
    }
}
