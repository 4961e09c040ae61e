// src/validator/mod.rs
//! Merkle proof validation for child chain blocks
//!
//! Every child block commits to a depth-16 keccak-256 Merkle tree whose leaves
//! are `keccak(tx_hash || signatures)`. A proof is the 16 sibling hashes from
//! leaf to root, concatenated. Interior nodes hash the plain 64-byte
//! concatenation of their children.

mod merkle_tree;
mod signatures;

pub use merkle_tree::{zero_hashes, MerkleTree, MAX_LEAVES};
pub use signatures::{
    is_zero_signature, recover_address, split_signatures, SIGNATURES_LENGTH, SIGNATURE_LENGTH,
};

use solana_program::keccak;

use crate::error_handling::ValidatorError;

/// Depth of every child block tree
pub const MERKLE_DEPTH: usize = 16;

/// Length of one node hash
pub const HASH_LENGTH: usize = 32;

/// Length of a complete proof
pub const PROOF_LENGTH: usize = MERKLE_DEPTH * HASH_LENGTH;

/// Hash two nodes together
pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    keccak::hashv(&[left.as_ref(), right.as_ref()]).to_bytes()
}

/// Leaf committed for a transaction: `keccak(tx_hash || signatures)`
pub fn leaf_hash(tx_hash: &[u8; 32], signatures: &[u8]) -> [u8; 32] {
    keccak::hashv(&[tx_hash.as_ref(), signatures]).to_bytes()
}

/// Digest signed by input owners once they have seen their transaction
/// included: `keccak(tx_hash || signatures || root)`
pub fn confirmation_hash(tx_hash: &[u8; 32], signatures: &[u8], root: &[u8; 32]) -> [u8; 32] {
    keccak::hashv(&[tx_hash.as_ref(), signatures, root.as_ref()]).to_bytes()
}

/// Return `length` bytes of `bytes` starting at `offset`
pub fn slice(bytes: &[u8], offset: usize, length: usize) -> Result<&[u8], ValidatorError> {
    let out_of_bounds = ValidatorError::SliceOutOfBounds {
        offset,
        length,
        available: bytes.len(),
    };

    let end = offset.checked_add(length).ok_or_else(|| out_of_bounds.clone())?;
    bytes.get(offset..end).ok_or(out_of_bounds)
}

/// Check that `leaf` sits at `index` of the tree with root `root`
///
/// Bit `i` of `index` says whether the running hash is the right child at
/// level `i`. A proof of any length other than `PROOF_LENGTH`, or an index
/// that does not fit the tree, is an error rather than a mismatch.
pub fn check_membership(
    leaf: &[u8; 32],
    index: u64,
    root: &[u8; 32],
    proof: &[u8],
) -> Result<bool, ValidatorError> {
    if proof.len() != PROOF_LENGTH {
        return Err(ValidatorError::InvalidProofLength {
            expected: PROOF_LENGTH,
            actual: proof.len(),
        });
    }

    if index >= MAX_LEAVES as u64 {
        return Err(ValidatorError::IndexOutOfRange(index));
    }

    let mut computed = *leaf;
    let mut path = index;

    for level in 0..MERKLE_DEPTH {
        let mut sibling = [0u8; 32];
        sibling.copy_from_slice(slice(proof, level * HASH_LENGTH, HASH_LENGTH)?);

        computed = if path & 1 == 0 {
            hash_pair(&computed, &sibling)
        } else {
            hash_pair(&sibling, &computed)
        };

        path >>= 1;
    }

    Ok(computed == *root)
}
