// src/exit_queue/mod.rs
//! Exit queues
//!
//! Pending exits wait in priority queues until their challenge period has
//! passed. The priority packs the age of the exited UTXO into the high 64
//! bits and the encoded position into the low 64 bits, so older UTXOs leave
//! first and, among equally old ones, lower positions do.

mod priority_queue;

pub use priority_queue::{PriorityQueue, QueueEntry};

use crate::transaction::UtxoPosition;

/// Priority of an exit started at `now`
///
/// The age is the UTXO creation time, clamped so that nothing counts as
/// older than one challenge period before the exit started. An exit of a
/// very old UTXO therefore cannot jump ahead of exits that are already
/// finalizable.
pub fn priority_for(
    position: &UtxoPosition,
    utxo_created_at: u64,
    now: u64,
    challenge_period: u64,
) -> u128 {
    let age = utxo_created_at.max(now.saturating_sub(challenge_period));
    ((age as u128) << 64) | position.encode() as u128
}
