//! Worker dispatch gate.
//!
//! Bounds how many transactions are in validation at once. A transaction that
//! cannot get a slot waits in FIFO order; it is never rejected for lack of a
//! worker (that is what pool capacity is for).

use super::entities::Hash;
use std::collections::VecDeque;

/// Result of asking for a worker slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Slot taken, dispatch now.
    Granted,
    /// No slot free. `position` is the 1-based queue position.
    Queued { position: usize },
}

/// Counting gate with a wait queue.
#[derive(Debug)]
pub struct WorkerDispatch {
    max_workers: usize,
    active: usize,
    queue: VecDeque<Hash>,
}

impl WorkerDispatch {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            active: 0,
            queue: VecDeque::new(),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Slots currently held.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Transactions waiting for a slot.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_saturated(&self) -> bool {
        self.active >= self.max_workers
    }

    /// Takes a slot for `hash`, or queues it.
    pub fn try_acquire(&mut self, hash: Hash) -> Admission {
        if self.active < self.max_workers && self.queue.is_empty() {
            self.active += 1;
            Admission::Granted
        } else {
            self.queue.push_back(hash);
            Admission::Queued {
                position: self.queue.len(),
            }
        }
    }

    /// Frees one slot.
    ///
    /// If a transaction is queued, the slot passes straight to it and its
    /// hash is returned; the caller must dispatch it (or release again).
    pub fn release(&mut self) -> Option<Hash> {
        let next = self.queue.pop_front();
        if next.is_none() {
            self.active = self.active.saturating_sub(1);
        }
        next
    }

    /// Removes `hash` from the wait queue. Returns true if it was queued.
    pub fn withdraw(&mut self, hash: &Hash) -> bool {
        match self.queue.iter().position(|queued| queued == hash) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drops every slot and queued entry.
    pub fn reset(&mut self) -> Vec<Hash> {
        self.active = 0;
        self.queue.drain(..).collect()
    }
}
