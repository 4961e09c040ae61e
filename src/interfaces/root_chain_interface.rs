// src/interfaces/root_chain_interface.rs
//! Root Chain Interface
//!
//! This module defines the interface for interacting with the root chain and
//! a thread-safe implementation that serializes every call behind a mutex.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{CallContext, ValueTransfer};
use crate::error_handling::{RootChainError, RootChainResult};
use crate::finalization::FinalizationReport;
use crate::root_chain::{Exit, RootChain, RootChainEvent, TransactionProof};
use crate::transaction::{Address, UtxoPosition};

/// Interface for interacting with the root chain
pub trait RootChainInterface {
    /// Deposit funds for `owner`
    fn deposit(&self, ctx: &CallContext, owner: Address, amount: u64) -> RootChainResult<u64>;

    /// Commit a child block root
    fn submit_block(&self, ctx: &CallContext, root: [u8; 32], block_number: u64) -> RootChainResult<()>;

    /// Start an exit of a transaction output
    fn start_exit(
        &self,
        ctx: &CallContext,
        proof: &TransactionProof,
        confirm_signatures: &[u8],
    ) -> RootChainResult<()>;

    /// Start an exit of a deposit
    fn start_deposit_exit(&self, ctx: &CallContext, nonce: u64) -> RootChainResult<()>;

    /// Challenge a pending exit
    fn challenge_exit(
        &self,
        ctx: &CallContext,
        exit_position: UtxoPosition,
        spend: &TransactionProof,
        confirm_signature: &[u8],
    ) -> RootChainResult<()>;

    /// Finalize matured exits
    fn finalize_exits(
        &self,
        ctx: &CallContext,
        max_to_process: Option<usize>,
    ) -> RootChainResult<FinalizationReport>;

    /// Withdraw the caller's balance
    fn withdraw(&self, ctx: &CallContext, transfer: &mut dyn ValueTransfer) -> RootChainResult<u64>;

    /// Get exit by position
    fn get_exit(&self, position: &UtxoPosition) -> RootChainResult<Option<Exit>>;

    /// Withdrawable balance of `owner`
    fn balance_of(&self, owner: &Address) -> RootChainResult<u64>;

    /// Drain emitted events
    fn take_events(&self) -> RootChainResult<Vec<RootChainEvent>>;
}

/// Root chain shared between threads
#[derive(Debug, Clone)]
pub struct SharedRootChain {
    /// The underlying root chain instance
    root_chain: Arc<Mutex<RootChain>>,
}

impl SharedRootChain {
    /// Create a new shared root chain
    pub fn new(root_chain: RootChain) -> Self {
        Self {
            root_chain: Arc::new(Mutex::new(root_chain)),
        }
    }

    /// Run `f` with exclusive access to the root chain
    pub fn with<T>(&self, f: impl FnOnce(&mut RootChain) -> RootChainResult<T>) -> RootChainResult<T> {
        let mut root_chain = self.lock()?;
        f(&mut *root_chain)
    }

    fn lock(&self) -> RootChainResult<MutexGuard<'_, RootChain>> {
        self.root_chain
            .lock()
            .map_err(|_| RootChainError::Internal("root chain lock poisoned".to_string()))
    }
}

impl RootChainInterface for SharedRootChain {
    fn deposit(&self, ctx: &CallContext, owner: Address, amount: u64) -> RootChainResult<u64> {
        self.lock()?.deposit(ctx, owner, amount)
    }

    fn submit_block(&self, ctx: &CallContext, root: [u8; 32], block_number: u64) -> RootChainResult<()> {
        self.lock()?.submit_block(ctx, root, block_number)
    }

    fn start_exit(
        &self,
        ctx: &CallContext,
        proof: &TransactionProof,
        confirm_signatures: &[u8],
    ) -> RootChainResult<()> {
        self.lock()?.start_exit(ctx, proof, confirm_signatures)
    }

    fn start_deposit_exit(&self, ctx: &CallContext, nonce: u64) -> RootChainResult<()> {
        self.lock()?.start_deposit_exit(ctx, nonce)
    }

    fn challenge_exit(
        &self,
        ctx: &CallContext,
        exit_position: UtxoPosition,
        spend: &TransactionProof,
        confirm_signature: &[u8],
    ) -> RootChainResult<()> {
        self.lock()?.challenge_exit(ctx, exit_position, spend, confirm_signature)
    }

    fn finalize_exits(
        &self,
        ctx: &CallContext,
        max_to_process: Option<usize>,
    ) -> RootChainResult<FinalizationReport> {
        self.lock()?.finalize_exits(ctx, max_to_process)
    }

    fn withdraw(&self, ctx: &CallContext, transfer: &mut dyn ValueTransfer) -> RootChainResult<u64> {
        self.lock()?.withdraw(ctx, transfer)
    }

    fn get_exit(&self, position: &UtxoPosition) -> RootChainResult<Option<Exit>> {
        Ok(self.lock()?.get_exit(position).cloned())
    }

    fn balance_of(&self, owner: &Address) -> RootChainResult<u64> {
        Ok(self.lock()?.balance_of(owner))
    }

    fn take_events(&self) -> RootChainResult<Vec<RootChainEvent>> {
        Ok(self.lock()?.take_events())
    }
}
