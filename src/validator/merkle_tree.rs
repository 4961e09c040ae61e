// src/validator/merkle_tree.rs
//! Fixed-depth Merkle tree for child chain blocks
//!
//! This module builds the canonical tree whose root the operator commits for
//! each child block. The tree always has `MERKLE_DEPTH` levels; a missing
//! sibling at level `i` is the root of an empty subtree of height `i`.

use borsh::{BorshDeserialize, BorshSerialize};

use super::{hash_pair, HASH_LENGTH, MERKLE_DEPTH};
use crate::error_handling::ValidatorError;

/// Maximum number of leaves in a tree
pub const MAX_LEAVES: usize = 1 << MERKLE_DEPTH;

/// Roots of empty subtrees: `Z0 = 0`, `Z(i+1) = H(Zi, Zi)`
pub fn zero_hashes() -> [[u8; 32]; MERKLE_DEPTH + 1] {
    let mut zeros = [[0u8; 32]; MERKLE_DEPTH + 1];
    for level in 0..MERKLE_DEPTH {
        zeros[level + 1] = hash_pair(&zeros[level], &zeros[level]);
    }
    zeros
}

/// Merkle Tree implementation
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct MerkleTree {
    /// Nodes per level, leaves first; only populated nodes are stored
    levels: Vec<Vec<[u8; 32]>>,

    /// Root of the tree
    root: [u8; 32],
}

impl MerkleTree {
    /// Create a new Merkle tree from leaves
    pub fn new(leaves: Vec<[u8; 32]>) -> Result<Self, ValidatorError> {
        if leaves.len() > MAX_LEAVES {
            return Err(ValidatorError::TooManyLeaves(leaves.len()));
        }

        let mut tree = Self {
            levels: vec![leaves],
            root: [0; 32],
        };
        tree.rebuild();

        Ok(tree)
    }

    /// Get the root of the tree
    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    /// Get the number of leaves in the tree
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Recompute every level above the leaves
    fn rebuild(&mut self) {
        let zeros = zero_hashes();
        self.levels.truncate(1);

        for level in 0..MERKLE_DEPTH {
            let current = &self.levels[level];
            let mut next = Vec::with_capacity((current.len() + 1) / 2);

            // Process pairs of nodes
            for i in (0..current.len()).step_by(2) {
                let left = current[i];
                let right = if i + 1 < current.len() {
                    current[i + 1]
                } else {
                    zeros[level]
                };
                next.push(hash_pair(&left, &right));
            }

            self.levels.push(next);
        }

        self.root = self.levels[MERKLE_DEPTH]
            .first()
            .copied()
            .unwrap_or(zeros[MERKLE_DEPTH]);
    }

    /// Generate the concatenated sibling proof for a leaf
    pub fn generate_proof(&self, index: usize) -> Option<Vec<u8>> {
        if index >= self.len() {
            return None;
        }

        let zeros = zero_hashes();
        let mut proof = Vec::with_capacity(MERKLE_DEPTH * HASH_LENGTH);
        let mut current_index = index;

        for level in 0..MERKLE_DEPTH {
            let sibling = self.levels[level]
                .get(current_index ^ 1)
                .copied()
                .unwrap_or(zeros[level]);
            proof.extend_from_slice(&sibling);

            // Move up the tree
            current_index >>= 1;
        }

        Some(proof)
    }
}
