// src/bridge/mod.rs
//! Bridge bookkeeping for the Plasma root chain
//!
//! This module holds the two records through which value crosses between
//! the root chain and the child chain: the deposit registry and the ledger
//! of withdrawable balances.

mod deposit_handler;
mod ledger;

pub use deposit_handler::{Deposit, DepositHandler};
pub use ledger::Ledger;
