//! Shared pending-transaction queue
//!
//! A double-ended priority queue: higher `validity.priority` pops first,
//! equal priorities pop in insertion order. [`TransactionQueue::push_front`]
//! places an entry in a front band that pops before every regular entry,
//! whatever its priority. Every operation takes the same mutex, so a
//! transaction is never observable as both queued and popped.

use crate::ports::TransactionSubmitter;
use parking_lot::Mutex;
use shared_types::PendingTransaction;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Requeued entries sort before regular ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Band {
    Front,
    Regular,
}

/// Front-band entries ignore priority so they pop in requeue order.
type QueueKey = (Band, Reverse<u64>, i64);

#[derive(Debug, Default)]
struct QueueInner {
    entries: BTreeMap<QueueKey, PendingTransaction>,
    next_back: i64,
    next_front: i64,
}

impl QueueInner {
    fn insert_back(&mut self, tx: PendingTransaction) {
        let key = (Band::Regular, Reverse(tx.validity.priority), self.next_back);
        self.next_back += 1;
        self.entries.insert(key, tx);
    }

    fn insert_front(&mut self, tx: PendingTransaction) {
        self.next_front -= 1;
        let key = (Band::Front, Reverse(0), self.next_front);
        self.entries.insert(key, tx);
    }
}

/// Thread-safe pending-transaction queue
#[derive(Debug, Default)]
pub struct TransactionQueue {
    inner: Mutex<QueueInner>,
}

impl TransactionQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction
    pub fn push(&self, tx: PendingTransaction) {
        self.inner.lock().insert_back(tx);
    }

    /// Insert a transaction ahead of every queued entry
    pub fn push_front(&self, tx: PendingTransaction) {
        self.inner.lock().insert_front(tx);
    }

    /// Return `txs` to the front, keeping their relative order.
    ///
    /// The whole batch is inserted under one lock.
    pub fn push_front_all(&self, txs: Vec<PendingTransaction>) {
        let mut inner = self.inner.lock();
        for tx in txs.into_iter().rev() {
            inner.insert_front(tx);
        }
    }

    /// Remove and return the next transaction
    pub fn pop_highest_priority(&self) -> Option<PendingTransaction> {
        self.inner.lock().entries.pop_first().map(|(_, tx)| tx)
    }

    /// Clone of the transaction that would pop next
    pub fn peek_front(&self) -> Option<PendingTransaction> {
        self.inner
            .lock()
            .entries
            .first_key_value()
            .map(|(_, tx)| tx.clone())
    }

    /// Number of queued transactions
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl TransactionSubmitter for TransactionQueue {
    fn submit(&self, transaction: PendingTransaction) {
        self.push(transaction);
    }

    fn pending_count(&self) -> usize {
        self.len()
    }
}
