// tests/unit/finalization_test.rs
#[cfg(test)]
mod tests {
    use crate::helpers::*;
    use plasma_root_chain::{
        Address, ExitState, PayoutLog, RootChainError, RootChainEvent, StopReason, UtxoPosition,
    };

    #[test]
    fn test_finalization_follows_priority() {
        let mut chain = TestChain::new();
        let alice = Signer::new(2);
        let bob = Signer::new(3);
        let t0 = chain.now;

        // Two deposits in the same lane
        let alice_deposit = chain.deposit(&alice, 100);
        let bob_deposit = chain.deposit(&bob, 50);
        assert_eq!(alice_deposit, UtxoPosition::deposit(1));
        assert_eq!(bob_deposit, UtxoPosition::deposit(2));

        // Alice moves the deposit to a new output in block 1000
        chain.now = t0 + 10;
        let spend = signed_tx(
            [alice_deposit, UtxoPosition::NULL],
            [(alice.address, 100), (Address::ZERO, 0)],
            [Some(&alice), None],
        );
        let block = chain.submit_block(vec![spend.clone()]);

        // Alice exits the transaction output first
        chain.now = t0 + 20;
        let confirmations = spend.confirm(&block.root(), [Some(&alice), None]);
        let ctx = chain.paying(&alice, BOND);
        chain
            .root_chain
            .start_exit(&ctx, &block.proof(0, 0), &confirmations)
            .unwrap();

        // Bob exits the older deposit later
        chain.now = t0 + 30;
        let ctx = chain.paying(&bob, BOND);
        chain.root_chain.start_deposit_exit(&ctx, 1).unwrap();
        chain.root_chain.take_events();

        // The deposit exit heads the queues but is still challengeable
        chain.now = t0 + 20 + WEEK;
        let ctx = chain.ctx(&bob);
        let report = chain.root_chain.finalize_exits(&ctx, None).unwrap();
        assert!(report.finalized.is_empty());
        assert_eq!(report.stop_reason, StopReason::ChallengePeriodActive);

        chain.now = t0 + 30 + WEEK;
        let ctx = chain.ctx(&bob);
        let report = chain.root_chain.finalize_exits(&ctx, None).unwrap();
        assert_eq!(report.finalized, vec![bob_deposit, UtxoPosition::new(1000, 0, 0)]);
        assert_eq!(report.stop_reason, StopReason::QueueEmpty);

        assert_eq!(chain.root_chain.balance_of(&bob.address), 50 + BOND);
        assert_eq!(chain.root_chain.balance_of(&alice.address), 100 + BOND);
        assert_eq!(chain.root_chain.child_chain_balance(), 0);
        assert_eq!(chain.root_chain.exit_state(&bob_deposit), ExitState::Finalized);

        // Finalized deposits leave the registry
        assert!(chain.root_chain.get_deposit(1).is_none());

        // Each payout is a balance credit followed by the exit record
        let events = chain.root_chain.take_events();
        assert_eq!(
            events,
            vec![
                RootChainEvent::BalanceCredited {
                    owner: bob.address,
                    amount: 50 + BOND,
                },
                RootChainEvent::ExitFinalized {
                    position: bob_deposit,
                    owner: bob.address,
                    amount: 50,
                    confirm_signatures: Vec::new(),
                },
                RootChainEvent::BalanceCredited {
                    owner: alice.address,
                    amount: 100 + BOND,
                },
                RootChainEvent::ExitFinalized {
                    position: UtxoPosition::new(1000, 0, 0),
                    owner: alice.address,
                    amount: 100,
                    confirm_signatures: confirmations,
                },
            ]
        );
    }

    #[test]
    fn test_finalization_stops_when_funds_run_out() {
        let mut chain = TestChain::new();
        let alice = Signer::new(2);
        let mallory = Signer::new(4);

        chain.deposit(&alice, 100);
        chain.advance(10);

        // The authority commits a block minting value for Mallory
        let forged = signed_tx(
            [UtxoPosition::new(1000, 5, 0), UtxoPosition::NULL],
            [(mallory.address, 1_000_000), (Address::ZERO, 0)],
            [Some(&mallory), None],
        );
        let block = chain.submit_block(vec![forged.clone()]);
        chain.advance(10);

        let ctx = chain.paying(&alice, BOND);
        chain.root_chain.start_deposit_exit(&ctx, 0).unwrap();

        let confirmations = forged.confirm(&block.root(), [Some(&mallory), None]);
        let ctx = chain.paying(&mallory, BOND);
        chain
            .root_chain
            .start_exit(&ctx, &block.proof(0, 0), &confirmations)
            .unwrap();

        chain.advance(WEEK + 1);
        let ctx = chain.ctx(&alice);
        let report = chain.root_chain.finalize_exits(&ctx, None).unwrap();

        assert_eq!(report.finalized, vec![UtxoPosition::deposit(1)]);
        assert_eq!(report.stop_reason, StopReason::InsufficientFunds);
        assert_eq!(chain.root_chain.balance_of(&alice.address), 100 + BOND);
        assert_eq!(chain.root_chain.balance_of(&mallory.address), 0);

        let forged_position = UtxoPosition::new(1000, 0, 0);
        assert_eq!(chain.root_chain.exit_state(&forged_position), ExitState::Pending);
        assert_eq!(chain.root_chain.queued_exits(), (0, 1));

        // Retrying changes nothing
        let report = chain.root_chain.finalize_exits(&ctx, None).unwrap();
        assert!(report.finalized.is_empty());
        assert_eq!(report.stop_reason, StopReason::InsufficientFunds);
    }

    #[test]
    fn test_single_queue_finalization_and_budget() {
        let mut chain = TestChain::new();
        let alice = Signer::new(2);

        for amount in [10, 20, 30] {
            chain.deposit(&alice, amount);
        }
        for nonce in 0..3 {
            let ctx = chain.paying(&alice, BOND);
            chain.root_chain.start_deposit_exit(&ctx, nonce).unwrap();
        }
        chain.advance(WEEK);

        // Transaction queue has nothing to do
        let ctx = chain.ctx(&alice);
        let report = chain.root_chain.finalize_transaction_exits(&ctx, None).unwrap();
        assert!(report.finalized.is_empty());
        assert_eq!(report.stop_reason, StopReason::QueueEmpty);

        let report = chain.root_chain.finalize_deposit_exits(&ctx, Some(2)).unwrap();
        assert_eq!(
            report.finalized,
            vec![UtxoPosition::deposit(1), UtxoPosition::deposit(2)]
        );
        assert_eq!(report.stop_reason, StopReason::BudgetExhausted);

        let report = chain.root_chain.finalize_deposit_exits(&ctx, Some(2)).unwrap();
        assert_eq!(report.finalized, vec![UtxoPosition::deposit(3)]);
        assert_eq!(report.stop_reason, StopReason::QueueEmpty);

        assert_eq!(chain.root_chain.balance_of(&alice.address), 60 + 3 * BOND);

        // Finalization takes no value
        let ctx = chain.paying(&alice, 1);
        let result = chain.root_chain.finalize_exits(&ctx, None);
        assert!(matches!(result, Err(RootChainError::InvalidAmount(_))));
    }

    #[test]
    fn test_withdraw_finalized_exit() {
        let mut chain = TestChain::new();
        let alice = Signer::new(2);

        chain.deposit(&alice, 100);
        let ctx = chain.paying(&alice, BOND);
        chain.root_chain.start_deposit_exit(&ctx, 0).unwrap();
        chain.advance(WEEK);

        let ctx = chain.ctx(&alice);
        chain.root_chain.finalize_exits(&ctx, None).unwrap();
        chain.root_chain.take_events();

        // A rejected transfer keeps the balance
        let mut rejecting = PayoutLog {
            reject: true,
            ..PayoutLog::new()
        };
        let result = chain.root_chain.withdraw(&ctx, &mut rejecting);
        assert!(matches!(result, Err(RootChainError::TransferFailed(_))));
        assert_eq!(chain.root_chain.balance_of(&alice.address), 100 + BOND);
        assert!(chain.root_chain.take_events().is_empty());

        let mut payouts = PayoutLog::new();
        let amount = chain.root_chain.withdraw(&ctx, &mut payouts).unwrap();
        assert_eq!(amount, 100 + BOND);
        assert_eq!(payouts.received_by(&alice.address), 100 + BOND);
        assert_eq!(chain.root_chain.balance_of(&alice.address), 0);
        assert_eq!(chain.root_chain.contract_balance(), 0);
        assert_eq!(
            chain.root_chain.take_events(),
            vec![RootChainEvent::Withdrawn {
                owner: alice.address,
                amount: 100 + BOND,
            }]
        );

        let result = chain.root_chain.withdraw(&ctx, &mut payouts);
        assert!(matches!(result, Err(RootChainError::InsufficientFunds(_))));
    }
}
