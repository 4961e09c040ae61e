// src/instruction.rs
//! Root chain instructions
//!
//! Every root chain operation can be submitted as a Borsh-encoded
//! `RootChainInstruction` and routed through `RootChain::process_instruction`.

use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;

use crate::error_handling::{RootChainError, RootChainResult};
use crate::finalization::FinalizationReport;
use crate::interfaces::{CallContext, ValueTransfer};
use crate::root_chain::{RootChain, TransactionProof};
use crate::transaction::{Address, UtxoPosition};

/// Instructions supported by the root chain
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum RootChainInstruction {
    /// Deposit the attached value for `owner`
    Deposit {
        /// Owner of the deposit
        owner: Address,
        /// Amount, equal to the attached value
        amount: u64,
    },

    /// Deposit, failing if `validator_block` is not the next child block
    DepositAt {
        /// Next child block as seen by the depositor
        validator_block: u64,
        /// Owner of the deposit
        owner: Address,
        /// Amount, equal to the attached value
        amount: u64,
    },

    /// Commit one child block root (authority only)
    SubmitBlock {
        /// Merkle root
        root: [u8; 32],
        /// Child block number
        block_number: u64,
    },

    /// Commit consecutive child block roots (authority only)
    SubmitBlocks {
        /// Merkle roots in block order
        roots: Vec<[u8; 32]>,
        /// Number of the first block
        first_block_number: u64,
    },

    /// Start an exit of a transaction output, attaching the bond
    StartExit {
        /// Exited output and its inclusion proof
        proof: TransactionProof,
        /// Confirmation signatures, one slot per input
        confirm_signatures: Vec<u8>,
    },

    /// Start an exit of a deposit, attaching the bond
    StartDepositExit {
        /// Deposit nonce
        nonce: u64,
    },

    /// Challenge a pending exit with the transaction spending it
    ChallengeExit {
        /// Position of the challenged exit
        exit_position: UtxoPosition,
        /// Spending transaction and its inclusion proof
        spend: TransactionProof,
        /// Exit owner's confirmation of the spending transaction
        confirm_signature: Vec<u8>,
    },

    /// Finalize exits from both queues
    FinalizeExits {
        /// Maximum number of exits to process
        max_to_process: Option<u32>,
    },

    /// Finalize deposit exits
    FinalizeDepositExits {
        /// Maximum number of exits to process
        max_to_process: Option<u32>,
    },

    /// Finalize transaction exits
    FinalizeTransactionExits {
        /// Maximum number of exits to process
        max_to_process: Option<u32>,
    },

    /// Withdraw the caller's balance
    Withdraw,
}

impl RootChainInstruction {
    /// Encode the instruction
    pub fn pack(&self) -> RootChainResult<Vec<u8>> {
        self.try_to_vec()
            .map_err(|e| RootChainError::InvalidTransaction(format!("unencodable instruction: {}", e)))
    }

    /// Decode an instruction
    pub fn unpack(data: &[u8]) -> RootChainResult<Self> {
        Self::try_from_slice(data)
            .map_err(|e| RootChainError::InvalidTransaction(format!("undecodable instruction: {}", e)))
    }
}

/// Result of a processed instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionOutcome {
    /// Nonce of a new deposit
    Deposited(u64),

    /// Report of a finalization call
    Finalized(FinalizationReport),

    /// Amount withdrawn
    Withdrawn(u64),

    /// Instruction applied with nothing to report
    Applied,
}

impl RootChain {
    /// Decode `data` and apply the instruction
    pub fn process_instruction(
        &mut self,
        ctx: &CallContext,
        data: &[u8],
        transfer: &mut dyn ValueTransfer,
    ) -> RootChainResult<InstructionOutcome> {
        let instruction = RootChainInstruction::unpack(data)?;
        debug!("Processing instruction from {}: {:?}", ctx.caller, instruction);

        let max = |limit: Option<u32>| limit.map(|limit| limit as usize);

        match instruction {
            RootChainInstruction::Deposit { owner, amount } => {
                self.deposit(ctx, owner, amount).map(InstructionOutcome::Deposited)
            }
            RootChainInstruction::DepositAt {
                validator_block,
                owner,
                amount,
            } => self
                .deposit_at(ctx, validator_block, owner, amount)
                .map(InstructionOutcome::Deposited),
            RootChainInstruction::SubmitBlock { root, block_number } => {
                self.submit_block(ctx, root, block_number)?;
                Ok(InstructionOutcome::Applied)
            }
            RootChainInstruction::SubmitBlocks {
                roots,
                first_block_number,
            } => {
                self.submit_blocks(ctx, &roots, first_block_number)?;
                Ok(InstructionOutcome::Applied)
            }
            RootChainInstruction::StartExit {
                proof,
                confirm_signatures,
            } => {
                self.start_exit(ctx, &proof, &confirm_signatures)?;
                Ok(InstructionOutcome::Applied)
            }
            RootChainInstruction::StartDepositExit { nonce } => {
                self.start_deposit_exit(ctx, nonce)?;
                Ok(InstructionOutcome::Applied)
            }
            RootChainInstruction::ChallengeExit {
                exit_position,
                spend,
                confirm_signature,
            } => {
                self.challenge_exit(ctx, exit_position, &spend, &confirm_signature)?;
                Ok(InstructionOutcome::Applied)
            }
            RootChainInstruction::FinalizeExits { max_to_process } => self
                .finalize_exits(ctx, max(max_to_process))
                .map(InstructionOutcome::Finalized),
            RootChainInstruction::FinalizeDepositExits { max_to_process } => self
                .finalize_deposit_exits(ctx, max(max_to_process))
                .map(InstructionOutcome::Finalized),
            RootChainInstruction::FinalizeTransactionExits { max_to_process } => self
                .finalize_transaction_exits(ctx, max(max_to_process))
                .map(InstructionOutcome::Finalized),
            RootChainInstruction::Withdraw => self.withdraw(ctx, transfer).map(InstructionOutcome::Withdrawn),
        }
    }
}
