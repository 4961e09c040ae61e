// src/root_chain/deposits.rs
//! Deposits into and withdrawals out of the root chain

use log::{info, warn};

use super::{RootChain, RootChainEvent};
use crate::error_handling::{RootChainError, RootChainResult};
use crate::interfaces::{CallContext, ValueTransfer};
use crate::transaction::Address;

impl RootChain {
    /// Deposit `amount` for `owner`; the attached value must equal the amount
    pub fn deposit(&mut self, ctx: &CallContext, owner: Address, amount: u64) -> RootChainResult<u64> {
        if ctx.value != amount {
            return Err(RootChainError::InvalidAmount(format!(
                "deposit of {} with attached value {}",
                amount, ctx.value
            )));
        }

        // Reserve the lane slot first so a full lane changes nothing
        self.state.deposits.next_deposit_block(self.state.current_child_block)?;

        self.state.ledger.accept_payment(ctx.value, amount, &ctx.caller, 0)?;

        let deposit = self.state.deposits.record_deposit(
            owner,
            amount,
            self.state.current_child_block,
            ctx.timestamp,
        )?;

        self.emit(RootChainEvent::Deposited {
            owner,
            nonce: deposit.nonce,
            amount,
        });

        Ok(deposit.nonce)
    }

    /// Deposit, provided the depositor has seen every committed child block
    pub fn deposit_at(
        &mut self,
        ctx: &CallContext,
        validator_block: u64,
        owner: Address,
        amount: u64,
    ) -> RootChainResult<u64> {
        if validator_block != self.state.current_child_block {
            return Err(RootChainError::StaleReference(format!(
                "deposit made against child block {}, next is {}",
                validator_block, self.state.current_child_block
            )));
        }

        self.deposit(ctx, owner, amount)
    }

    /// Send the caller's whole balance through `transfer`
    pub fn withdraw(&mut self, ctx: &CallContext, transfer: &mut dyn ValueTransfer) -> RootChainResult<u64> {
        Self::require_no_value(ctx, "withdraw")?;

        // Take the balance out before handing control to the transfer
        let amount = self.state.ledger.begin_withdrawal(&ctx.caller)?;

        if let Err(reason) = transfer.transfer(&ctx.caller, amount) {
            self.state.ledger.restore_withdrawal(&ctx.caller, amount);
            warn!("Withdrawal of {} to {} failed: {}", amount, ctx.caller, reason);
            return Err(RootChainError::TransferFailed(reason));
        }

        info!("Withdrew {} to {}", amount, ctx.caller);
        self.emit(RootChainEvent::Withdrawn {
            owner: ctx.caller,
            amount,
        });

        Ok(amount)
    }
}
