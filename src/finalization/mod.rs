// src/finalization/mod.rs
//! Finalization of exits
//!
//! This module drains the exit queues in priority order once the challenge
//! period of the exit at the head of a queue has passed. Each finalized exit
//! credits its amount and bond to the owner's withdrawable balance.
//!
//! A finalization call processes a bounded number of exits and stops early,
//! without error, when the next exit is not yet finalizable or the contract
//! cannot fund it. Work done before the stop is kept; the next call resumes
//! from the queue head.

use log::{debug, info, warn};
use serde::Serialize;

use crate::error_handling::RootChainResult;
use crate::exit_queue::QueueEntry;
use crate::interfaces::CallContext;
use crate::root_chain::{ExitKind, ExitState, RootChain, RootChainEvent};
use crate::transaction::UtxoPosition;

/// Why a finalization call stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// No exits left in the processed queues
    QueueEmpty,

    /// The next exit is still inside its challenge period
    ChallengePeriodActive,

    /// The contract cannot pay the next exit
    InsufficientFunds,

    /// The per-call budget was used up
    BudgetExhausted,
}

/// Outcome of a finalization call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizationReport {
    /// Positions finalized, in order
    pub finalized: Vec<UtxoPosition>,

    /// Why processing stopped
    pub stop_reason: StopReason,
}

/// Queues processed by a finalization call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueSelection {
    Both,
    Deposits,
    Transactions,
}

impl QueueSelection {
    fn includes(&self, kind: ExitKind) -> bool {
        match self {
            QueueSelection::Both => true,
            QueueSelection::Deposits => kind == ExitKind::Deposit,
            QueueSelection::Transactions => kind == ExitKind::Transaction,
        }
    }
}

impl RootChain {
    /// Finalize exits from both queues in priority order
    pub fn finalize_exits(
        &mut self,
        ctx: &CallContext,
        max_to_process: Option<usize>,
    ) -> RootChainResult<FinalizationReport> {
        self.finalize_queues(ctx, QueueSelection::Both, max_to_process)
    }

    /// Finalize deposit exits only
    pub fn finalize_deposit_exits(
        &mut self,
        ctx: &CallContext,
        max_to_process: Option<usize>,
    ) -> RootChainResult<FinalizationReport> {
        self.finalize_queues(ctx, QueueSelection::Deposits, max_to_process)
    }

    /// Finalize transaction exits only
    pub fn finalize_transaction_exits(
        &mut self,
        ctx: &CallContext,
        max_to_process: Option<usize>,
    ) -> RootChainResult<FinalizationReport> {
        self.finalize_queues(ctx, QueueSelection::Transactions, max_to_process)
    }

    fn finalize_queues(
        &mut self,
        ctx: &CallContext,
        selection: QueueSelection,
        max_to_process: Option<usize>,
    ) -> RootChainResult<FinalizationReport> {
        Self::require_no_value(ctx, "finalize_exits")?;

        let budget = max_to_process.unwrap_or(self.config.max_exits_per_finalize);
        let contract = self.config.contract_address;
        let mut finalized = Vec::new();

        let stop_reason = loop {
            if finalized.len() >= budget {
                break StopReason::BudgetExhausted;
            }

            let (kind, entry) = match self.next_queued_exit(selection) {
                Some(next) => next,
                None => break StopReason::QueueEmpty,
            };

            let pending = self
                .state
                .exits
                .get(&entry.position)
                .filter(|exit| exit.state == ExitState::Pending)
                .cloned();
            let exit = match pending {
                Some(exit) => exit,
                None => {
                    // Entry without a pending exit behind it
                    warn!("Dropping stale queue entry {}", entry.position);
                    self.queue_mut(kind).del_min(&contract)?;
                    continue;
                }
            };

            // Check the challenge period has passed
            if exit.created_at.saturating_add(self.config.challenge_period) > ctx.timestamp {
                debug!("Exit {} still in its challenge period", exit.position);
                break StopReason::ChallengePeriodActive;
            }

            // Check the contract can fund the payout
            let payout = match exit.amount.checked_add(exit.bond) {
                Some(payout) if payout <= self.state.ledger.available_for_payout() => payout,
                _ => {
                    warn!(
                        "Exit {} of {} exceeds available funds {}",
                        exit.position,
                        exit.amount,
                        self.state.ledger.available_for_payout()
                    );
                    break StopReason::InsufficientFunds;
                }
            };

            if let Err(error) = self.state.ledger.release(&exit.owner, payout) {
                warn!("Cannot release funds for exit {}: {}", exit.position, error);
                break StopReason::InsufficientFunds;
            }
            self.queue_mut(kind).del_min(&contract)?;

            if let Some(record) = self.state.exits.get_mut(&entry.position) {
                record.state = ExitState::Finalized;
            }

            if kind == ExitKind::Deposit {
                let nonce = self
                    .state
                    .deposits
                    .get_by_position(&exit.position)
                    .map(|deposit| deposit.nonce);
                if let Some(nonce) = nonce {
                    self.state.deposits.remove(nonce);
                }
            }

            self.emit(RootChainEvent::BalanceCredited {
                owner: exit.owner,
                amount: payout,
            });
            finalized.push(exit.position);
            self.emit(RootChainEvent::ExitFinalized {
                position: exit.position,
                owner: exit.owner,
                amount: exit.amount,
                confirm_signatures: exit.confirm_signatures,
            });
        };

        info!(
            "Finalized {} exits, stopped: {:?}",
            finalized.len(),
            stop_reason
        );

        Ok(FinalizationReport {
            finalized,
            stop_reason,
        })
    }

    /// Head of the selected queues with the lowest priority
    fn next_queued_exit(&self, selection: QueueSelection) -> Option<(ExitKind, QueueEntry)> {
        let deposit = self
            .state
            .deposit_exit_queue
            .get_min()
            .filter(|_| selection.includes(ExitKind::Deposit))
            .map(|entry| (ExitKind::Deposit, entry));
        let transaction = self
            .state
            .transaction_exit_queue
            .get_min()
            .filter(|_| selection.includes(ExitKind::Transaction))
            .map(|entry| (ExitKind::Transaction, entry));

        match (deposit, transaction) {
            (Some(d), Some(t)) => Some(if t.1.priority < d.1.priority { t } else { d }),
            (d, t) => d.or(t),
        }
    }
}
