// src/bridge/deposit_handler.rs
//! Deposit registry for the Plasma root chain
//!
//! Deposits are addressed on the child chain by block numbers taken from the
//! lane between the last committed child block and the next one. The lane
//! restarts after every block submission.

use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error_handling::{RootChainError, RootChainResult};
use crate::transaction::{Address, UtxoPosition, CHILD_BLOCK_INTERVAL};

/// Deposit information
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Deposit {
    /// Deposit nonce, unique and increasing
    pub nonce: u64,

    /// Owner of the deposited funds
    pub owner: Address,

    /// Amount
    pub amount: u64,

    /// Deposit block number in the lane
    pub block_number: u64,

    /// Timestamp of the deposit
    pub created_at: u64,
}

impl Deposit {
    /// Position of the deposit's single output
    pub fn position(&self) -> UtxoPosition {
        UtxoPosition::deposit(self.block_number)
    }
}

/// Deposit registry
#[derive(Debug, Clone, Default, BorshSerialize, BorshDeserialize)]
pub struct DepositHandler {
    /// Deposits by nonce
    deposits: BTreeMap<u64, Deposit>,

    /// Deposit nonce by deposit block number
    nonces_by_block: BTreeMap<u64, u64>,

    /// Next nonce to assign
    next_nonce: u64,

    /// Offset of the next deposit block in the current lane, starting at 1
    current_deposit_block: u64,
}

impl DepositHandler {
    /// Create a new deposit handler
    pub fn new() -> Self {
        Self {
            deposits: BTreeMap::new(),
            nonces_by_block: BTreeMap::new(),
            next_nonce: 0,
            current_deposit_block: 1,
        }
    }

    /// Block number the next deposit will occupy
    pub fn next_deposit_block(&self, current_child_block: u64) -> RootChainResult<u64> {
        if self.current_deposit_block >= CHILD_BLOCK_INTERVAL {
            return Err(RootChainError::DepositLaneExhausted(format!(
                "{} deposits already placed before child block {}",
                CHILD_BLOCK_INTERVAL - 1,
                current_child_block
            )));
        }

        Ok(current_child_block - CHILD_BLOCK_INTERVAL + self.current_deposit_block)
    }

    /// Record a deposit, taking the next nonce and lane slot
    pub fn record_deposit(
        &mut self,
        owner: Address,
        amount: u64,
        current_child_block: u64,
        timestamp: u64,
    ) -> RootChainResult<Deposit> {
        let block_number = self.next_deposit_block(current_child_block)?;

        let deposit = Deposit {
            nonce: self.next_nonce,
            owner,
            amount,
            block_number,
            created_at: timestamp,
        };

        self.deposits.insert(deposit.nonce, deposit.clone());
        self.nonces_by_block.insert(block_number, deposit.nonce);
        self.next_nonce += 1;
        self.current_deposit_block += 1;

        debug!(
            "Recorded deposit {} of {} for {} in block {}",
            deposit.nonce, amount, owner, block_number
        );

        Ok(deposit)
    }

    /// Start a new lane after a child block submission
    pub fn reset_lane(&mut self) {
        self.current_deposit_block = 1;
    }

    /// Get a deposit by nonce
    pub fn get(&self, nonce: u64) -> Option<&Deposit> {
        self.deposits.get(&nonce)
    }

    /// Get the deposit whose output sits at `position`
    pub fn get_by_position(&self, position: &UtxoPosition) -> Option<&Deposit> {
        if !position.is_deposit() {
            return None;
        }

        self.nonces_by_block
            .get(&position.block_number)
            .and_then(|nonce| self.deposits.get(nonce))
    }

    /// Remove a deposit once it has been exited
    pub fn remove(&mut self, nonce: u64) -> Option<Deposit> {
        let deposit = self.deposits.remove(&nonce)?;
        self.nonces_by_block.remove(&deposit.block_number);
        Some(deposit)
    }

    /// Next nonce to assign
    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    /// Offset of the next deposit block in the current lane
    pub fn current_deposit_block(&self) -> u64 {
        self.current_deposit_block
    }

    /// Number of live deposits
    pub fn len(&self) -> usize {
        self.deposits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty()
    }
}
