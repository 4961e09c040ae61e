// src/root_chain/events.rs
//! Events emitted by the root chain

use serde::{Deserialize, Serialize};

use crate::transaction::{Address, UtxoPosition};

/// Root chain event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RootChainEvent {
    /// A child block root was committed
    BlockSubmitted {
        #[serde(with = "hex::serde")]
        root: [u8; 32],
        number: u64,
    },

    /// Funds were deposited
    Deposited { owner: Address, nonce: u64, amount: u64 },

    /// An exit was started
    ///
    /// Carries the confirmation signatures of the exited transaction's
    /// inputs, so an exit of one of those inputs can be challenged with them.
    ExitStarted {
        position: UtxoPosition,
        owner: Address,
        amount: u64,
        #[serde(with = "hex::serde")]
        confirm_signatures: Vec<u8>,
    },

    /// A pending exit was successfully challenged
    ExitChallenged {
        position: UtxoPosition,
        challenger: Address,
    },

    /// An exit was paid out to its owner's balance
    ExitFinalized {
        position: UtxoPosition,
        owner: Address,
        amount: u64,
        #[serde(with = "hex::serde")]
        confirm_signatures: Vec<u8>,
    },

    /// A withdrawable balance was credited
    BalanceCredited { owner: Address, amount: u64 },

    /// A balance was transferred out
    Withdrawn { owner: Address, amount: u64 },
}

impl RootChainEvent {
    /// Event name
    pub fn name(&self) -> &'static str {
        match self {
            RootChainEvent::BlockSubmitted { .. } => "BlockSubmitted",
            RootChainEvent::Deposited { .. } => "Deposited",
            RootChainEvent::ExitStarted { .. } => "ExitStarted",
            RootChainEvent::ExitChallenged { .. } => "ExitChallenged",
            RootChainEvent::ExitFinalized { .. } => "ExitFinalized",
            RootChainEvent::BalanceCredited { .. } => "BalanceCredited",
            RootChainEvent::Withdrawn { .. } => "Withdrawn",
        }
    }

    /// JSON rendering for logs and external consumers
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"event\":\"{}\"}}", self.name()))
    }
}
