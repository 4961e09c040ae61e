// src/exit_queue/priority_queue.rs
//! Binary min-heap of pending exits
//!
//! Only the owner of the queue (the root chain contract) may modify it. The
//! backing array is 0-indexed: the children of `i` are `2i + 1` and `2i + 2`.

use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;

use crate::error_handling::QueueError;
use crate::transaction::Address;

/// Queue entry
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    /// Ordering key, lower first
    pub priority: u128,

    /// Encoded position of the exit
    pub position: u64,
}

/// Owner-restricted priority queue
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct PriorityQueue {
    /// Only address allowed to mutate the queue
    owner: Address,

    /// Heap storage
    heap: Vec<QueueEntry>,
}

impl PriorityQueue {
    /// Create an empty queue owned by `owner`
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            heap: Vec::new(),
        }
    }

    /// Owner of the queue
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Number of entries
    pub fn current_size(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entry with the lowest priority, if any
    pub fn get_min(&self) -> Option<QueueEntry> {
        self.heap.first().copied()
    }

    /// Whether an entry for `position` is queued
    pub fn contains(&self, position: u64) -> bool {
        self.heap.iter().any(|entry| entry.position == position)
    }

    /// Insert an entry
    pub fn insert(&mut self, caller: &Address, priority: u128, position: u64) -> Result<(), QueueError> {
        self.check_owner(caller)?;

        self.heap.push(QueueEntry { priority, position });
        let last = self.heap.len() - 1;
        self.sift_up(last);

        debug!("Queued position {} with priority {}", position, priority);
        Ok(())
    }

    /// Remove and return the entry with the lowest priority
    pub fn del_min(&mut self, caller: &Address) -> Result<QueueEntry, QueueError> {
        self.check_owner(caller)?;

        if self.heap.is_empty() {
            return Err(QueueError::Empty);
        }

        Ok(self.remove_at(0))
    }

    /// Remove the entry for `position`
    pub fn remove(&mut self, caller: &Address, position: u64) -> Result<QueueEntry, QueueError> {
        self.check_owner(caller)?;

        let index = self
            .heap
            .iter()
            .position(|entry| entry.position == position)
            .ok_or(QueueError::NotFound(position))?;

        Ok(self.remove_at(index))
    }

    /// Entries in heap order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.heap
    }

    fn check_owner(&self, caller: &Address) -> Result<(), QueueError> {
        if *caller != self.owner {
            return Err(QueueError::Unauthorized);
        }
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> QueueEntry {
        let removed = self.heap.swap_remove(index);

        // The former last entry now sits at `index` and may belong above or below it
        if index < self.heap.len() {
            if index > 0 && self.heap[index].priority < self.heap[(index - 1) / 2].priority {
                self.sift_up(index);
            } else {
                self.sift_down(index);
            }
        }

        removed
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[parent].priority <= self.heap[index].priority {
                break;
            }
            self.heap.swap(parent, index);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }

            let right = left + 1;
            let smaller = if right < len && self.heap[right].priority < self.heap[left].priority {
                right
            } else {
                left
            };

            if self.heap[smaller].priority >= self.heap[index].priority {
                break;
            }
            self.heap.swap(smaller, index);
            index = smaller;
        }
    }
}
