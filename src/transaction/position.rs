// src/transaction/position.rs
//! UTXO positions
//!
//! A position names one output of one transaction in one child block. It is
//! packed into a single `u64` so that lower blocks, then lower transaction
//! indexes, then lower output indexes sort first.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error_handling::{RootChainError, RootChainResult};

/// Spacing between child block numbers; deposits use the numbers in between
pub const CHILD_BLOCK_INTERVAL: u64 = 1000;

/// Multiplier of the block number in an encoded position
pub const BLOCK_OFFSET: u64 = 1_000_000_000;

/// Multiplier of the transaction index in an encoded position
pub const TX_OFFSET: u64 = 10_000;

/// Exclusive upper bound of the transaction index
pub const MAX_TX_INDEX: u32 = 100_000;

/// Outputs per transaction
pub const OUTPUTS_PER_TX: u8 = 2;

/// Largest block number whose every position still encodes into a `u64`
pub const MAX_BLOCK_NUMBER: u64 = u64::MAX / BLOCK_OFFSET - 1;

/// Position of a UTXO on the child chain
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash,
    PartialOrd, Ord, Default,
)]
pub struct UtxoPosition {
    /// Child block number, or deposit block number for deposits
    pub block_number: u64,

    /// Index of the transaction in the block
    pub tx_index: u32,

    /// Index of the output in the transaction
    pub output_index: u8,
}

impl UtxoPosition {
    /// The null input
    pub const NULL: UtxoPosition = UtxoPosition {
        block_number: 0,
        tx_index: 0,
        output_index: 0,
    };

    /// Create a new position
    pub fn new(block_number: u64, tx_index: u32, output_index: u8) -> Self {
        Self {
            block_number,
            tx_index,
            output_index,
        }
    }

    /// Position of the single output of a deposit
    pub fn deposit(block_number: u64) -> Self {
        Self::new(block_number, 0, 0)
    }

    /// Whether this is the null input
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Whether the position lies in the deposit lane between two child blocks
    pub fn is_deposit(&self) -> bool {
        !self.is_null() && self.block_number % CHILD_BLOCK_INTERVAL != 0
    }

    /// Check the components fit the packed encoding
    pub fn validate(&self) -> RootChainResult<()> {
        if self.block_number > MAX_BLOCK_NUMBER {
            return Err(RootChainError::InvalidTransaction(format!(
                "block number {} exceeds {}",
                self.block_number, MAX_BLOCK_NUMBER
            )));
        }

        if self.tx_index >= MAX_TX_INDEX {
            return Err(RootChainError::InvalidTransaction(format!(
                "transaction index {} exceeds {}",
                self.tx_index,
                MAX_TX_INDEX - 1
            )));
        }

        if self.output_index >= OUTPUTS_PER_TX {
            return Err(RootChainError::InvalidTransaction(format!(
                "output index {} exceeds {}",
                self.output_index,
                OUTPUTS_PER_TX - 1
            )));
        }

        if self.is_deposit() && (self.tx_index != 0 || self.output_index != 0) {
            return Err(RootChainError::InvalidTransaction(format!(
                "deposit position {} must address output 0 of transaction 0",
                self
            )));
        }

        Ok(())
    }

    /// Pack into a `u64`. Only meaningful for validated positions.
    pub fn encode(&self) -> u64 {
        self.block_number * BLOCK_OFFSET + self.tx_index as u64 * TX_OFFSET + self.output_index as u64
    }

    /// Unpack a value produced by `encode`
    pub fn decode(encoded: u64) -> Self {
        Self {
            block_number: encoded / BLOCK_OFFSET,
            tx_index: ((encoded % BLOCK_OFFSET) / TX_OFFSET) as u32,
            output_index: (encoded % TX_OFFSET) as u8,
        }
    }
}

impl fmt::Display for UtxoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.block_number, self.tx_index, self.output_index)
    }
}
