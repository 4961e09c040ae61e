// src/bridge/ledger.rs
//! Root chain ledger
//!
//! Tracks the value held by the contract, the part of it still owed to the
//! child chain, and the per-account balances that finalized exits, challenge
//! rewards and bond surpluses are credited to. A balance leaves the ledger
//! only through `withdraw`.

use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;
use std::collections::BTreeMap;

use crate::error_handling::{RootChainError, RootChainResult};
use crate::transaction::Address;

fn overflow(what: &str) -> RootChainError {
    RootChainError::Internal(format!("{} overflow", what))
}

/// Ledger state
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Ledger {
    /// Withdrawable balance per account
    balances: BTreeMap<Address, u64>,

    /// Sum of all balances
    total_withdraw_balance: u64,

    /// Deposits and bonds not yet paid out
    child_chain_balance: u64,

    /// Value held by the contract
    contract_balance: u64,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `value` received by the contract, of which `owed` is held
    /// for the child chain and `surplus` is credited back to `payer`
    pub fn accept_payment(
        &mut self,
        value: u64,
        owed: u64,
        payer: &Address,
        surplus: u64,
    ) -> RootChainResult<()> {
        if owed.checked_add(surplus) != Some(value) {
            return Err(RootChainError::InvalidAmount(format!(
                "payment of {} does not split into {} owed and {} surplus",
                value, owed, surplus
            )));
        }

        // Compute everything before touching state
        let contract_balance = self
            .contract_balance
            .checked_add(value)
            .ok_or_else(|| overflow("contract balance"))?;
        let child_chain_balance = self
            .child_chain_balance
            .checked_add(owed)
            .ok_or_else(|| overflow("child chain balance"))?;
        let total_withdraw_balance = self
            .total_withdraw_balance
            .checked_add(surplus)
            .ok_or_else(|| overflow("withdraw balance"))?;
        let payer_balance = self
            .balance_of(payer)
            .checked_add(surplus)
            .ok_or_else(|| overflow("account balance"))?;

        self.contract_balance = contract_balance;
        self.child_chain_balance = child_chain_balance;
        self.total_withdraw_balance = total_withdraw_balance;
        if surplus > 0 {
            self.balances.insert(*payer, payer_balance);
        }

        Ok(())
    }

    /// Move `amount` owed to the child chain into `recipient`'s balance
    pub fn release(&mut self, recipient: &Address, amount: u64) -> RootChainResult<()> {
        let child_chain_balance = self.child_chain_balance.checked_sub(amount).ok_or_else(|| {
            RootChainError::Internal(format!(
                "release of {} exceeds child chain balance {}",
                amount, self.child_chain_balance
            ))
        })?;
        let total_withdraw_balance = self
            .total_withdraw_balance
            .checked_add(amount)
            .ok_or_else(|| overflow("withdraw balance"))?;
        let recipient_balance = self
            .balance_of(recipient)
            .checked_add(amount)
            .ok_or_else(|| overflow("account balance"))?;

        self.child_chain_balance = child_chain_balance;
        self.total_withdraw_balance = total_withdraw_balance;
        self.balances.insert(*recipient, recipient_balance);

        debug!("Credited {} to {}", amount, recipient);
        Ok(())
    }

    /// Take `owner`'s whole balance out of the ledger ahead of a transfer
    pub fn begin_withdrawal(&mut self, owner: &Address) -> RootChainResult<u64> {
        let amount = self.balance_of(owner);
        if amount == 0 {
            return Err(RootChainError::InsufficientFunds(format!(
                "{} has nothing to withdraw",
                owner
            )));
        }

        let total_withdraw_balance = self
            .total_withdraw_balance
            .checked_sub(amount)
            .ok_or_else(|| RootChainError::Internal("withdraw balance underflow".to_string()))?;
        let contract_balance = self
            .contract_balance
            .checked_sub(amount)
            .ok_or_else(|| RootChainError::Internal("contract balance underflow".to_string()))?;

        self.balances.remove(owner);
        self.total_withdraw_balance = total_withdraw_balance;
        self.contract_balance = contract_balance;

        Ok(amount)
    }

    /// Undo `begin_withdrawal` after a failed transfer
    pub fn restore_withdrawal(&mut self, owner: &Address, amount: u64) {
        // Exact inverse of begin_withdrawal, which checked these bounds
        self.balances.insert(*owner, amount);
        self.total_withdraw_balance += amount;
        self.contract_balance += amount;
    }

    /// Withdrawable balance of `owner`
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Funds that can still be paid out to exits
    pub fn available_for_payout(&self) -> u64 {
        self.contract_balance.saturating_sub(self.total_withdraw_balance)
    }

    pub fn child_chain_balance(&self) -> u64 {
        self.child_chain_balance
    }

    pub fn total_withdraw_balance(&self) -> u64 {
        self.total_withdraw_balance
    }

    pub fn contract_balance(&self) -> u64 {
        self.contract_balance
    }
}
