// src/lib.rs
//! Plasma Root Chain
//!
//! This crate implements the root chain side of a Plasma child chain:
//! - Block commitments and deposits
//! - Exits with Merkle inclusion proofs and confirmation signatures
//! - Challenges that cancel exits of spent outputs
//! - Priority-ordered, bounded finalization of exits
//! - Withdrawable balances and durable state snapshots

pub mod bridge;
pub mod error_handling;
pub mod exit_queue;
pub mod finalization;
pub mod instruction;
pub mod interfaces;
pub mod root_chain;
pub mod storage;
pub mod transaction;
pub mod validator;

pub use bridge::{Deposit, Ledger};
pub use error_handling::{RootChainError, RootChainResult};
pub use finalization::{FinalizationReport, StopReason};
pub use instruction::{InstructionOutcome, RootChainInstruction};
pub use interfaces::{CallContext, PayoutLog, RootChainInterface, SharedRootChain, ValueTransfer};
pub use root_chain::{
    ChildBlock, Exit, ExitKind, ExitState, RootChain, RootChainEvent, RootChainState, TransactionProof,
};
pub use storage::StateStore;
pub use transaction::{Address, Transaction, TxOutput, UtxoPosition};

use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bond required to start an exit
pub const DEFAULT_MIN_EXIT_BOND: u64 = 10_000;

/// Default challenge period in seconds
pub const DEFAULT_CHALLENGE_PERIOD: u64 = 7 * 24 * 60 * 60;

/// Default number of root chain blocks between two child block submissions
pub const DEFAULT_PRESUMED_FINALITY_BLOCKS: u64 = 6;

/// Default number of exits a single finalization call may process
pub const DEFAULT_MAX_EXITS_PER_FINALIZE: usize = 128;

/// Default address of the root chain contract, owner of the exit queues
pub const DEFAULT_CONTRACT_ADDRESS: Address = Address([0xc0; 20]);

/// Root chain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootChainConfig {
    /// Only address allowed to submit child blocks
    pub authority: Address,

    /// Address of the root chain contract itself
    pub contract_address: Address,

    /// Bond required to start an exit
    pub min_exit_bond: u64,

    /// Challenge period in seconds
    pub challenge_period: u64,

    /// Root chain blocks required between child block submissions
    pub presumed_finality_blocks: u64,

    /// Exits processed by one finalization call when no budget is given
    pub max_exits_per_finalize: usize,
}

impl Default for RootChainConfig {
    fn default() -> Self {
        Self {
            authority: Address::ZERO,
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            min_exit_bond: DEFAULT_MIN_EXIT_BOND,
            challenge_period: DEFAULT_CHALLENGE_PERIOD,
            presumed_finality_blocks: DEFAULT_PRESUMED_FINALITY_BLOCKS,
            max_exits_per_finalize: DEFAULT_MAX_EXITS_PER_FINALIZE,
        }
    }
}

impl RootChainConfig {
    /// Default configuration with the given block authority
    pub fn with_authority(authority: Address) -> Self {
        Self {
            authority,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> RootChainResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RootChainResult<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RootChainError::Configuration(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> RootChainResult<()> {
        if self.authority.is_zero() {
            return Err(RootChainError::Configuration("authority must be set".to_string()));
        }

        if self.contract_address == self.authority {
            return Err(RootChainError::Configuration(
                "contract address must differ from the authority".to_string(),
            ));
        }

        if self.challenge_period == 0 {
            return Err(RootChainError::Configuration(
                "challenge period must be positive".to_string(),
            ));
        }

        if self.max_exits_per_finalize == 0 {
            return Err(RootChainError::Configuration(
                "max exits per finalize must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Initialize logging from `RUST_LOG`, defaulting to `info`
pub fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        info!("Logger initialized");
    }
}
