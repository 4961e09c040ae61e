// src/root_chain/mod.rs
//! Plasma root chain state machine
//!
//! The root chain accepts child block commitments from the authority and
//! deposits from anyone, and adjudicates exits. Each position moves through
//! `NonExistent -> Pending -> {Challenged, Finalized}`; the last two are
//! terminal.
//!
//! Every operation takes a `CallContext` and runs all of its checks before it
//! mutates anything, so a failed call leaves the state and the event buffer
//! exactly as they were.

mod blocks;
mod deposits;
mod events;
mod exits;

pub use events::RootChainEvent;
pub use exits::TransactionProof;

use borsh::{BorshDeserialize, BorshSerialize};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bridge::{Deposit, DepositHandler, Ledger};
use crate::error_handling::{RootChainError, RootChainResult};
use crate::exit_queue::PriorityQueue;
use crate::interfaces::CallContext;
use crate::transaction::{Address, UtxoPosition, CHILD_BLOCK_INTERVAL};
use crate::RootChainConfig;

/// Committed child block
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ChildBlock {
    /// Merkle root of the block's transactions
    pub root: [u8; 32],

    /// Root chain timestamp of the submission
    pub timestamp: u64,
}

/// Exit lifecycle state
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum ExitState {
    /// No exit was ever started
    #[default]
    NonExistent,

    /// Waiting for the challenge period to pass
    Pending,

    /// Cancelled by a challenge
    Challenged,

    /// Paid out to the owner's balance
    Finalized,
}

/// Which queue an exit waits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum ExitKind {
    /// Exit of a deposit output
    Deposit,

    /// Exit of a transaction output
    Transaction,
}

/// Exit record
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Exit {
    /// Owner of the exited output
    pub owner: Address,

    /// Amount of the exited output
    pub amount: u64,

    /// Position of the exited output
    pub position: UtxoPosition,

    /// Bond held for the exit
    pub bond: u64,

    /// Lifecycle state
    pub state: ExitState,

    /// Queue the exit waits in
    pub kind: ExitKind,

    /// Timestamp the exit was started at
    pub created_at: u64,

    /// Queue priority
    pub priority: u128,

    /// Input confirmation signatures the exit was started with, empty for
    /// deposit exits
    pub confirm_signatures: Vec<u8>,
}

/// Complete persistent state of the root chain
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct RootChainState {
    /// Committed child blocks by number
    pub child_blocks: BTreeMap<u64, ChildBlock>,

    /// Number the next child block must carry
    pub current_child_block: u64,

    /// Root chain height of the last submission
    pub last_submission_height: Option<u64>,

    /// Deposit registry
    pub deposits: DepositHandler,

    /// Exits by encoded position
    pub exits: BTreeMap<u64, Exit>,

    /// Pending deposit exits
    pub deposit_exit_queue: PriorityQueue,

    /// Pending transaction exits
    pub transaction_exit_queue: PriorityQueue,

    /// Balances
    pub ledger: Ledger,
}

impl RootChainState {
    /// Empty state whose queues are owned by `contract_address`
    pub fn new(contract_address: Address) -> Self {
        Self {
            child_blocks: BTreeMap::new(),
            current_child_block: CHILD_BLOCK_INTERVAL,
            last_submission_height: None,
            deposits: DepositHandler::new(),
            exits: BTreeMap::new(),
            deposit_exit_queue: PriorityQueue::new(contract_address),
            transaction_exit_queue: PriorityQueue::new(contract_address),
            ledger: Ledger::new(),
        }
    }
}

/// Plasma root chain
#[derive(Debug)]
pub struct RootChain {
    /// Configuration
    pub(crate) config: RootChainConfig,

    /// Persistent state
    pub(crate) state: RootChainState,

    /// Events of successful calls not yet taken
    pub(crate) events: Vec<RootChainEvent>,
}

impl RootChain {
    /// Create a new root chain
    pub fn new(config: RootChainConfig) -> RootChainResult<Self> {
        config.validate()?;
        let state = RootChainState::new(config.contract_address);

        info!(
            "Root chain created with authority {} and challenge period {}s",
            config.authority, config.challenge_period
        );

        Ok(Self {
            config,
            state,
            events: Vec::new(),
        })
    }

    /// Resume from a previously saved state
    pub fn restore(config: RootChainConfig, state: RootChainState) -> RootChainResult<Self> {
        config.validate()?;

        if *state.deposit_exit_queue.owner() != config.contract_address
            || *state.transaction_exit_queue.owner() != config.contract_address
        {
            return Err(RootChainError::Configuration(format!(
                "saved exit queues are not owned by {}",
                config.contract_address
            )));
        }

        info!(
            "Root chain restored at child block {} with {} exits",
            state.current_child_block,
            state.exits.len()
        );

        Ok(Self {
            config,
            state,
            events: Vec::new(),
        })
    }

    /// Configuration
    pub fn config(&self) -> &RootChainConfig {
        &self.config
    }

    /// Persistent state, for snapshots
    pub fn state(&self) -> &RootChainState {
        &self.state
    }

    /// Block authority
    pub fn authority(&self) -> &Address {
        &self.config.authority
    }

    /// Drain the events emitted since the last call
    pub fn take_events(&mut self) -> Vec<RootChainEvent> {
        std::mem::take(&mut self.events)
    }

    /// Exit at `position`, if one was ever started
    pub fn get_exit(&self, position: &UtxoPosition) -> Option<&Exit> {
        position.validate().ok()?;
        self.state.exits.get(&position.encode())
    }

    /// State of the exit at `position`
    pub fn exit_state(&self, position: &UtxoPosition) -> ExitState {
        self.get_exit(position).map(|exit| exit.state).unwrap_or_default()
    }

    /// Withdrawable balance of `owner`
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.state.ledger.balance_of(owner)
    }

    /// Funds still owed to the child chain
    pub fn child_chain_balance(&self) -> u64 {
        self.state.ledger.child_chain_balance()
    }

    /// Value held by the contract
    pub fn contract_balance(&self) -> u64 {
        self.state.ledger.contract_balance()
    }

    /// Sum of all withdrawable balances
    pub fn total_withdraw_balance(&self) -> u64 {
        self.state.ledger.total_withdraw_balance()
    }

    /// Committed child block
    pub fn get_child_block(&self, number: u64) -> Option<&ChildBlock> {
        self.state.child_blocks.get(&number)
    }

    /// Deposit by nonce
    pub fn get_deposit(&self, nonce: u64) -> Option<&Deposit> {
        self.state.deposits.get(nonce)
    }

    /// Number the next child block must carry
    pub fn current_child_block(&self) -> u64 {
        self.state.current_child_block
    }

    /// Offset of the next deposit in the current deposit lane
    pub fn current_deposit_block(&self) -> u64 {
        self.state.deposits.current_deposit_block()
    }

    /// Nonce the next deposit will receive
    pub fn deposit_nonce(&self) -> u64 {
        self.state.deposits.next_nonce()
    }

    /// Number of exits waiting in the deposit and transaction queues
    pub fn queued_exits(&self) -> (usize, usize) {
        (
            self.state.deposit_exit_queue.current_size(),
            self.state.transaction_exit_queue.current_size(),
        )
    }

    pub(crate) fn emit(&mut self, event: RootChainEvent) {
        info!("{}", event.to_json());
        self.events.push(event);
    }

    pub(crate) fn require_no_value(ctx: &CallContext, operation: &str) -> RootChainResult<()> {
        if ctx.value != 0 {
            warn!("{} called with value {}", operation, ctx.value);
            return Err(RootChainError::InvalidAmount(format!(
                "{} does not accept value",
                operation
            )));
        }
        Ok(())
    }

    pub(crate) fn committed_block(&self, number: u64) -> RootChainResult<ChildBlock> {
        self.state
            .child_blocks
            .get(&number)
            .copied()
            .ok_or_else(|| RootChainError::StaleReference(format!("child block {} is not committed", number)))
    }

    pub(crate) fn queue_mut(&mut self, kind: ExitKind) -> &mut PriorityQueue {
        match kind {
            ExitKind::Deposit => &mut self.state.deposit_exit_queue,
            ExitKind::Transaction => &mut self.state.transaction_exit_queue,
        }
    }
}
