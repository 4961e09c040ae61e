// src/root_chain/exits.rs
//! Starting and challenging exits

use borsh::{BorshDeserialize, BorshSerialize};
use log::{debug, info, warn};

use super::{ChildBlock, Exit, ExitKind, ExitState, RootChain, RootChainEvent};
use crate::error_handling::{RootChainError, RootChainResult};
use crate::exit_queue::priority_for;
use crate::interfaces::CallContext;
use crate::transaction::{Address, Transaction, TxOutput, UtxoPosition};
use crate::validator::{
    check_membership, confirmation_hash, is_zero_signature, leaf_hash, recover_address,
    split_signatures, SIGNATURES_LENGTH,
};

/// A transaction together with the evidence of its inclusion in a child block
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionProof {
    /// Position in the child chain; the output index selects the exited output
    pub position: UtxoPosition,

    /// Encoded transaction
    pub tx_bytes: Vec<u8>,

    /// Concatenated Merkle siblings from leaf to root
    pub proof: Vec<u8>,

    /// One signature per input, zero-filled for absent inputs
    pub signatures: Vec<u8>,
}

/// Transaction whose inclusion has been verified
struct IncludedTransaction {
    transaction: Transaction,
    tx_hash: [u8; 32],
    block: ChildBlock,
}

impl RootChain {
    /// Start an exit of a transaction output
    ///
    /// The caller must own the output, attach at least the minimum bond and
    /// provide, for every input, a confirmation signature by the input's
    /// signer over the transaction's confirmation hash.
    pub fn start_exit(
        &mut self,
        ctx: &CallContext,
        proof: &TransactionProof,
        confirm_signatures: &[u8],
    ) -> RootChainResult<()> {
        self.check_bond(ctx)?;

        let position = proof.position;
        self.check_not_exited(&position)?;

        let included = self.verify_inclusion(proof)?;
        let transaction = &included.transaction;

        // Check the caller owns the exited output
        let output = *transaction.output(position.output_index).ok_or_else(|| {
            RootChainError::InvalidTransaction(format!("no output {} in transaction", position.output_index))
        })?;
        if output.owner != ctx.caller {
            warn!("{} tried to exit {} owned by {}", ctx.caller, position, output.owner);
            return Err(RootChainError::Unauthorized(format!(
                "output {} is owned by {}",
                position, output.owner
            )));
        }

        if transaction.input(0).map_or(true, |input| input.is_null()) {
            return Err(RootChainError::InvalidTransaction(
                "first input must not be null".to_string(),
            ));
        }

        self.check_confirmations(&included, &proof.signatures, confirm_signatures)?;

        self.open_exit(
            ctx,
            output,
            position,
            ExitKind::Transaction,
            included.block.timestamp,
            confirm_signatures.to_vec(),
        )
    }

    /// Start an exit of a deposit that has not been spent on the child chain
    pub fn start_deposit_exit(&mut self, ctx: &CallContext, nonce: u64) -> RootChainResult<()> {
        self.check_bond(ctx)?;

        let deposit = self
            .state
            .deposits
            .get(nonce)
            .cloned()
            .ok_or_else(|| RootChainError::StaleReference(format!("no deposit with nonce {}", nonce)))?;

        if deposit.owner != ctx.caller {
            return Err(RootChainError::Unauthorized(format!(
                "deposit {} is owned by {}",
                nonce, deposit.owner
            )));
        }

        let position = deposit.position();
        self.check_not_exited(&position)?;

        let output = TxOutput {
            owner: deposit.owner,
            amount: deposit.amount,
        };
        self.open_exit(
            ctx,
            output,
            position,
            ExitKind::Deposit,
            deposit.created_at,
            Vec::new(),
        )
    }

    /// Challenge a pending exit with a committed transaction that spends it
    ///
    /// The spending transaction must sit in a later child block than the
    /// exited output. `confirm_signature` must be the exit owner's
    /// confirmation signature of the spending transaction; for an output that
    /// was spent directly into another exit, it is published in that exit's
    /// `ExitStarted` event. On success the exit is cancelled and its bond goes
    /// to the challenger.
    pub fn challenge_exit(
        &mut self,
        ctx: &CallContext,
        exit_position: UtxoPosition,
        spend: &TransactionProof,
        confirm_signature: &[u8],
    ) -> RootChainResult<()> {
        Self::require_no_value(ctx, "challenge_exit")?;

        let exit = self
            .get_exit(&exit_position)
            .filter(|exit| exit.state == ExitState::Pending)
            .cloned()
            .ok_or_else(|| RootChainError::ExitNotFound(format!("no pending exit at {}", exit_position)))?;

        let included = self.verify_inclusion(spend)?;

        // Check the transaction spends the exited output directly
        if !included.transaction.spends(&exit_position) {
            return Err(RootChainError::InvalidTransaction(format!(
                "transaction at {} does not spend {}",
                spend.position, exit_position
            )));
        }
        if spend.position.block_number <= exit_position.block_number {
            return Err(RootChainError::InvalidTransaction(format!(
                "spend at {} is not later than {}",
                spend.position, exit_position
            )));
        }

        let confirm_hash = confirmation_hash(&included.tx_hash, &spend.signatures, &included.block.root);
        let signer = recover_address(&confirm_hash, confirm_signature)?;
        if signer != exit.owner {
            warn!(
                "Challenge of {} signed by {} instead of {}",
                exit_position, signer, exit.owner
            );
            return Err(RootChainError::InvalidSignature(format!(
                "confirmation signed by {}, exit owned by {}",
                signer, exit.owner
            )));
        }

        let contract = self.config.contract_address;
        let encoded = exit_position.encode();
        if !self.queue_mut(exit.kind).contains(encoded) {
            return Err(RootChainError::Internal(format!("pending exit {} is not queued", exit_position)));
        }

        self.state.ledger.release(&ctx.caller, exit.bond)?;
        self.queue_mut(exit.kind).remove(&contract, encoded)?;
        if let Some(record) = self.state.exits.get_mut(&encoded) {
            record.state = ExitState::Challenged;
        }

        info!("Exit {} challenged by {}", exit_position, ctx.caller);
        self.emit(RootChainEvent::BalanceCredited {
            owner: ctx.caller,
            amount: exit.bond,
        });
        self.emit(RootChainEvent::ExitChallenged {
            position: exit_position,
            challenger: ctx.caller,
        });

        Ok(())
    }

    fn check_bond(&self, ctx: &CallContext) -> RootChainResult<()> {
        if ctx.value < self.config.min_exit_bond {
            return Err(RootChainError::InsufficientFunds(format!(
                "bond of {} below minimum {}",
                ctx.value, self.config.min_exit_bond
            )));
        }
        Ok(())
    }

    fn check_not_exited(&self, position: &UtxoPosition) -> RootChainResult<()> {
        if let Some(exit) = self.get_exit(position) {
            return Err(RootChainError::DuplicateExit(format!(
                "exit of {} already {:?}",
                position, exit.state
            )));
        }
        Ok(())
    }

    /// Decode a transaction and check it is included in its committed block
    fn verify_inclusion(&self, proof: &TransactionProof) -> RootChainResult<IncludedTransaction> {
        let position = proof.position;
        position.validate()?;
        if position.is_null() || position.is_deposit() {
            return Err(RootChainError::InvalidTransaction(format!(
                "{} is not a transaction position",
                position
            )));
        }

        let block = self.committed_block(position.block_number)?;
        let transaction = Transaction::decode(&proof.tx_bytes)?;

        if proof.signatures.len() != SIGNATURES_LENGTH {
            return Err(RootChainError::InvalidSignature(format!(
                "expected {} signature bytes, got {}",
                SIGNATURES_LENGTH,
                proof.signatures.len()
            )));
        }

        let tx_hash = Transaction::hash_bytes(&proof.tx_bytes);
        let leaf = leaf_hash(&tx_hash, &proof.signatures);

        if !check_membership(&leaf, position.tx_index as u64, &block.root, &proof.proof)? {
            warn!("Inclusion proof for {} does not match block root", position);
            return Err(RootChainError::InvalidProof(format!(
                "transaction not included at {}",
                position
            )));
        }

        Ok(IncludedTransaction {
            transaction,
            tx_hash,
            block,
        })
    }

    /// Check every input's signer also confirmed the transaction
    fn check_confirmations(
        &self,
        included: &IncludedTransaction,
        signatures: &[u8],
        confirm_signatures: &[u8],
    ) -> RootChainResult<()> {
        let signature_slots = split_signatures(signatures)?;
        let confirm_slots = split_signatures(confirm_signatures)?;
        let confirm_hash = confirmation_hash(&included.tx_hash, signatures, &included.block.root);

        for (slot, input) in included.transaction.inputs.iter().enumerate() {
            let input = input.position;

            if input.is_null() {
                if !is_zero_signature(confirm_slots[slot]) {
                    return Err(RootChainError::InvalidSignature(format!(
                        "confirmation for absent input {} must be empty",
                        slot
                    )));
                }
                continue;
            }

            let signer = recover_address(&included.tx_hash, signature_slots[slot])?;
            let confirmer = recover_address(&confirm_hash, confirm_slots[slot])?;
            if signer != confirmer {
                return Err(RootChainError::InvalidSignature(format!(
                    "input {} signed by {} but confirmed by {}",
                    slot, signer, confirmer
                )));
            }

            self.check_input_not_exiting(&input)?;

            if input.is_deposit() {
                self.check_deposit_owner(&input, &signer)?;
            }
        }

        Ok(())
    }

    fn check_input_not_exiting(&self, input: &UtxoPosition) -> RootChainResult<()> {
        match self.exit_state(input) {
            ExitState::Pending | ExitState::Finalized => Err(RootChainError::ConflictingInputExit(format!(
                "input {} has an exit that is {:?}",
                input,
                self.exit_state(input)
            ))),
            ExitState::NonExistent | ExitState::Challenged => Ok(()),
        }
    }

    fn check_deposit_owner(&self, input: &UtxoPosition, signer: &Address) -> RootChainResult<()> {
        let deposit = self
            .state
            .deposits
            .get_by_position(input)
            .ok_or_else(|| RootChainError::StaleReference(format!("no deposit at {}", input)))?;

        if deposit.owner != *signer {
            return Err(RootChainError::InvalidSignature(format!(
                "deposit {} owned by {}, spent by {}",
                deposit.nonce, deposit.owner, signer
            )));
        }
        Ok(())
    }

    /// Record a pending exit, take its bond and queue it
    fn open_exit(
        &mut self,
        ctx: &CallContext,
        output: TxOutput,
        position: UtxoPosition,
        kind: ExitKind,
        utxo_created_at: u64,
        confirm_signatures: Vec<u8>,
    ) -> RootChainResult<()> {
        let TxOutput { owner, amount } = output;
        let bond = self.config.min_exit_bond;
        let surplus = ctx.value - bond;
        let priority = priority_for(&position, utxo_created_at, ctx.timestamp, self.config.challenge_period);
        let contract = self.config.contract_address;

        self.state.ledger.accept_payment(ctx.value, bond, &ctx.caller, surplus)?;
        self.queue_mut(kind).insert(&contract, priority, position.encode())?;

        self.state.exits.insert(
            position.encode(),
            Exit {
                owner,
                amount,
                position,
                bond,
                state: ExitState::Pending,
                kind,
                created_at: ctx.timestamp,
                priority,
                confirm_signatures: confirm_signatures.clone(),
            },
        );

        debug!("Exit {} queued with priority {}", position, priority);
        self.emit(RootChainEvent::ExitStarted {
            position,
            owner,
            amount,
            confirm_signatures,
        });
        if surplus > 0 {
            self.emit(RootChainEvent::BalanceCredited {
                owner: ctx.caller,
                amount: surplus,
            });
        }

        Ok(())
    }
}
