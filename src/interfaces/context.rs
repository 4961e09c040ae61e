// src/interfaces/context.rs
//! Call context and outbound value transfer

use std::collections::BTreeMap;

use crate::transaction::Address;

/// Environment of a single call into the root chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Address of the caller
    pub caller: Address,

    /// Value attached to the call
    pub value: u64,

    /// Root chain timestamp in seconds
    pub timestamp: u64,

    /// Root chain block height
    pub root_height: u64,
}

impl CallContext {
    /// Create a context with no attached value
    pub fn new(caller: Address, timestamp: u64, root_height: u64) -> Self {
        Self {
            caller,
            value: 0,
            timestamp,
            root_height,
        }
    }

    /// Attach value to the call
    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

/// Sends value out of the root chain
pub trait ValueTransfer {
    /// Send `amount` to `recipient`; an error leaves the ledger untouched
    fn transfer(&mut self, recipient: &Address, amount: u64) -> Result<(), String>;
}

/// In-memory transfer target that records every payout
#[derive(Debug, Clone, Default)]
pub struct PayoutLog {
    /// Total received per recipient
    pub received: BTreeMap<Address, u64>,

    /// Reject every transfer when set
    pub reject: bool,
}

impl PayoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total received by `recipient`
    pub fn received_by(&self, recipient: &Address) -> u64 {
        self.received.get(recipient).copied().unwrap_or(0)
    }
}

impl ValueTransfer for PayoutLog {
    fn transfer(&mut self, recipient: &Address, amount: u64) -> Result<(), String> {
        if self.reject {
            return Err(format!("transfer of {} to {} rejected", amount, recipient));
        }

        *self.received.entry(*recipient).or_insert(0) += amount;
        Ok(())
    }
}
