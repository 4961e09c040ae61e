// src/root_chain/blocks.rs
//! Child block submission

use log::{debug, warn};

use super::{ChildBlock, RootChain, RootChainEvent};
use crate::error_handling::{RootChainError, RootChainResult};
use crate::interfaces::CallContext;
use crate::transaction::{CHILD_BLOCK_INTERVAL, MAX_BLOCK_NUMBER};

impl RootChain {
    /// Commit the root of the next child block
    pub fn submit_block(&mut self, ctx: &CallContext, root: [u8; 32], block_number: u64) -> RootChainResult<()> {
        self.submit_blocks(ctx, &[root], block_number)
    }

    /// Commit the roots of consecutive child blocks starting at `first_block_number`
    pub fn submit_blocks(
        &mut self,
        ctx: &CallContext,
        roots: &[[u8; 32]],
        first_block_number: u64,
    ) -> RootChainResult<()> {
        Self::require_no_value(ctx, "submit_block")?;

        // Check the caller is the authority
        if ctx.caller != self.config.authority {
            warn!("Block submission by non-authority {}", ctx.caller);
            return Err(RootChainError::Unauthorized(format!(
                "{} is not the block authority",
                ctx.caller
            )));
        }

        if roots.is_empty() {
            return Err(RootChainError::InvalidTransaction("no block roots submitted".to_string()));
        }

        // Check the numbering continues the chain
        if first_block_number != self.state.current_child_block {
            return Err(RootChainError::StaleReference(format!(
                "expected child block {}, got {}",
                self.state.current_child_block, first_block_number
            )));
        }

        let last_block_number = (roots.len() as u64 - 1)
            .checked_mul(CHILD_BLOCK_INTERVAL)
            .and_then(|span| first_block_number.checked_add(span))
            .filter(|last| *last <= MAX_BLOCK_NUMBER)
            .ok_or_else(|| RootChainError::InvalidTransaction("child block numbers exhausted".to_string()))?;

        // Check presumed finality of the previous submission
        if let Some(last_height) = self.state.last_submission_height {
            let ready_at = last_height.saturating_add(self.config.presumed_finality_blocks);
            if ctx.root_height < ready_at {
                return Err(RootChainError::PrematureSubmission(format!(
                    "previous submission at height {} is final at {}, now {}",
                    last_height, ready_at, ctx.root_height
                )));
            }
        }

        let mut number = first_block_number;
        for root in roots {
            self.state.child_blocks.insert(
                number,
                ChildBlock {
                    root: *root,
                    timestamp: ctx.timestamp,
                },
            );
            debug!("Committed child block {} with root {}", number, hex::encode(root));
            number += CHILD_BLOCK_INTERVAL;
        }

        self.state.current_child_block = last_block_number + CHILD_BLOCK_INTERVAL;
        self.state.last_submission_height = Some(ctx.root_height);
        self.state.deposits.reset_lane();

        let mut number = first_block_number;
        for root in roots {
            self.emit(RootChainEvent::BlockSubmitted { root: *root, number });
            number += CHILD_BLOCK_INTERVAL;
        }

        Ok(())
    }
}
