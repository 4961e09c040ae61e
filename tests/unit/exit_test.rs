// tests/unit/exit_test.rs
#[cfg(test)]
mod tests {
    use crate::helpers::*;
    use plasma_root_chain::{
        Address, ExitKind, ExitState, RootChainError, RootChainEvent, UtxoPosition,
    };

    /// Alice deposits 100 and pays it all to Bob in block 1000
    struct Scenario {
        chain: TestChain,
        alice: Signer,
        bob: Signer,
        deposit: UtxoPosition,
        spend: SignedTx,
        block: Block,
    }

    fn scenario() -> Scenario {
        let mut chain = TestChain::new();
        let alice = Signer::new(2);
        let bob = Signer::new(3);

        let deposit = chain.deposit(&alice, 100);
        chain.advance(10);

        let spend = signed_tx(
            [deposit, UtxoPosition::NULL],
            [(bob.address, 100), (Address::ZERO, 0)],
            [Some(&alice), None],
        );
        let block = chain.submit_block(vec![spend.clone()]);
        chain.advance(10);
        chain.root_chain.take_events();

        Scenario {
            chain,
            alice,
            bob,
            deposit,
            spend,
            block,
        }
    }

    #[test]
    fn test_start_exit_success() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);
        let proof = s.block.proof(0, 0);

        // Start the exit with 500 above the bond
        let ctx = s.chain.paying(&s.bob, BOND + 500);
        s.chain.root_chain.start_exit(&ctx, &proof, &confirmations).unwrap();

        let position = UtxoPosition::new(1000, 0, 0);
        let exit = s.chain.root_chain.get_exit(&position).unwrap().clone();
        assert_eq!(exit.owner, s.bob.address);
        assert_eq!(exit.amount, 100);
        assert_eq!(exit.bond, BOND);
        assert_eq!(exit.state, ExitState::Pending);
        assert_eq!(exit.kind, ExitKind::Transaction);
        assert_eq!(exit.confirm_signatures, confirmations);

        // Surplus is refundable, bond is held for the child chain
        assert_eq!(s.chain.root_chain.balance_of(&s.bob.address), 500);
        assert_eq!(s.chain.root_chain.child_chain_balance(), 100 + BOND);
        assert_eq!(s.chain.root_chain.contract_balance(), 100 + BOND + 500);
        assert_eq!(s.chain.root_chain.queued_exits(), (0, 1));

        assert_eq!(
            s.chain.root_chain.take_events(),
            vec![
                RootChainEvent::ExitStarted {
                    position,
                    owner: s.bob.address,
                    amount: 100,
                    confirm_signatures: confirmations.clone(),
                },
                RootChainEvent::BalanceCredited {
                    owner: s.bob.address,
                    amount: 500,
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_exit_rejected() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);
        let proof = s.block.proof(0, 0);

        let ctx = s.chain.paying(&s.bob, BOND);
        s.chain.root_chain.start_exit(&ctx, &proof, &confirmations).unwrap();
        s.chain.root_chain.take_events();

        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);
        assert!(matches!(result, Err(RootChainError::DuplicateExit(_))));
        assert!(s.chain.root_chain.take_events().is_empty());
        assert_eq!(s.chain.root_chain.contract_balance(), 100 + BOND);
    }

    #[test]
    fn test_exit_by_non_owner_rejected() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);
        let proof = s.block.proof(0, 0);

        let ctx = s.chain.paying(&s.alice, BOND);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);

        assert!(matches!(result, Err(RootChainError::Unauthorized(_))));
        assert_eq!(s.chain.root_chain.exit_state(&proof.position), ExitState::NonExistent);
    }

    #[test]
    fn test_bond_below_minimum_rejected() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);
        let proof = s.block.proof(0, 0);

        let ctx = s.chain.paying(&s.bob, BOND - 1);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);

        assert!(matches!(result, Err(RootChainError::InsufficientFunds(_))));
        assert_eq!(s.chain.root_chain.contract_balance(), 100);
    }

    #[test]
    fn test_invalid_inclusion_proof_rejected() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);

        // Flip a byte of the Merkle path
        let mut proof = s.block.proof(0, 0);
        proof.proof[40] ^= 0xff;
        let ctx = s.chain.paying(&s.bob, BOND);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);
        assert!(matches!(result, Err(RootChainError::InvalidProof(_))));

        // Claim a different transaction index
        let mut proof = s.block.proof(0, 0);
        proof.position = UtxoPosition::new(1000, 1, 0);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);
        assert!(matches!(result, Err(RootChainError::InvalidProof(_))));

        // Truncated proof
        let mut proof = s.block.proof(0, 0);
        proof.proof.truncate(64);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);
        assert!(matches!(result, Err(RootChainError::InvalidProof(_))));
    }

    #[test]
    fn test_confirmation_by_wrong_signer_rejected() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.bob), None]);
        let proof = s.block.proof(0, 0);

        let ctx = s.chain.paying(&s.bob, BOND);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);

        assert!(matches!(result, Err(RootChainError::InvalidSignature(_))));
    }

    #[test]
    fn test_confirmation_for_absent_input_must_be_empty() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), Some(&s.alice)]);
        let proof = s.block.proof(0, 0);

        let ctx = s.chain.paying(&s.bob, BOND);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);

        assert!(matches!(result, Err(RootChainError::InvalidSignature(_))));
    }

    #[test]
    fn test_deposit_spent_by_non_owner_rejected() {
        let mut chain = TestChain::new();
        let alice = Signer::new(2);
        let mallory = Signer::new(4);

        let deposit = chain.deposit(&alice, 100);

        // Mallory signs away Alice's deposit
        let theft = signed_tx(
            [deposit, UtxoPosition::NULL],
            [(mallory.address, 100), (Address::ZERO, 0)],
            [Some(&mallory), None],
        );
        let block = chain.submit_block(vec![theft.clone()]);
        let confirmations = theft.confirm(&block.root(), [Some(&mallory), None]);

        let ctx = chain.paying(&mallory, BOND);
        let result = chain.root_chain.start_exit(&ctx, &block.proof(0, 0), &confirmations);

        assert!(matches!(result, Err(RootChainError::InvalidSignature(_))));
    }

    #[test]
    fn test_first_input_must_be_present() {
        let mut chain = TestChain::new();
        let alice = Signer::new(2);

        let tx = signed_tx(
            [UtxoPosition::NULL, UtxoPosition::NULL],
            [(alice.address, 100), (Address::ZERO, 0)],
            [None, None],
        );
        let block = chain.submit_block(vec![tx.clone()]);
        let confirmations = tx.confirm(&block.root(), [None, None]);

        let ctx = chain.paying(&alice, BOND);
        let result = chain.root_chain.start_exit(&ctx, &block.proof(0, 0), &confirmations);

        assert!(matches!(result, Err(RootChainError::InvalidTransaction(_))));
    }

    #[test]
    fn test_exit_from_uncommitted_block_rejected() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);

        let mut proof = s.block.proof(0, 0);
        proof.position = UtxoPosition::new(2000, 0, 0);
        let ctx = s.chain.paying(&s.bob, BOND);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);

        assert!(matches!(result, Err(RootChainError::StaleReference(_))));
    }

    #[test]
    fn test_exit_conflicting_with_input_exit_rejected() {
        let mut s = scenario();

        // Alice exits the already spent deposit
        let ctx = s.chain.paying(&s.alice, BOND);
        s.chain.root_chain.start_deposit_exit(&ctx, 0).unwrap();
        assert_eq!(s.chain.root_chain.exit_state(&s.deposit), ExitState::Pending);

        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);
        let ctx = s.chain.paying(&s.bob, BOND);
        let result = s.chain.root_chain.start_exit(&ctx, &s.block.proof(0, 0), &confirmations);

        assert!(matches!(result, Err(RootChainError::ConflictingInputExit(_))));
    }

    #[test]
    fn test_deposit_exit_checks() {
        let mut s = scenario();

        // Unknown nonce
        let ctx = s.chain.paying(&s.alice, BOND);
        let result = s.chain.root_chain.start_deposit_exit(&ctx, 7);
        assert!(matches!(result, Err(RootChainError::StaleReference(_))));

        // Someone else's deposit
        let ctx = s.chain.paying(&s.bob, BOND);
        let result = s.chain.root_chain.start_deposit_exit(&ctx, 0);
        assert!(matches!(result, Err(RootChainError::Unauthorized(_))));

        // Bond too small
        let ctx = s.chain.paying(&s.alice, BOND - 1);
        let result = s.chain.root_chain.start_deposit_exit(&ctx, 0);
        assert!(matches!(result, Err(RootChainError::InsufficientFunds(_))));

        assert!(s.chain.root_chain.take_events().is_empty());

        let ctx = s.chain.paying(&s.alice, BOND);
        s.chain.root_chain.start_deposit_exit(&ctx, 0).unwrap();
        let result = s.chain.root_chain.start_deposit_exit(&ctx, 0);
        assert!(matches!(result, Err(RootChainError::DuplicateExit(_))));

        let exit = s.chain.root_chain.get_exit(&s.deposit).unwrap();
        assert_eq!(exit.kind, ExitKind::Deposit);
        assert_eq!(exit.amount, 100);
        assert!(exit.confirm_signatures.is_empty());
        assert_eq!(s.chain.root_chain.queued_exits(), (1, 0));
    }

    #[test]
    fn test_exit_of_deposit_position_through_start_exit_rejected() {
        let mut s = scenario();
        let confirmations = s.spend.confirm(&s.block.root(), [Some(&s.alice), None]);

        let mut proof = s.block.proof(0, 0);
        proof.position = s.deposit;
        let ctx = s.chain.paying(&s.bob, BOND);
        let result = s.chain.root_chain.start_exit(&ctx, &proof, &confirmations);

        assert!(matches!(result, Err(RootChainError::InvalidTransaction(_))));
    }
}
