use std::sync::{Mutex, MutexGuard, PoisonError};

use super::transaction::Transaction;

/// Staging buffer for transactions awaiting the next forged block
///
/// No deduplication or balance checks happen here. Every operation takes the
/// single inner lock, so a drain either sees a concurrent add or leaves it for
/// the next drain, never both.
#[derive(Debug, Default)]
pub struct TransactionPool {
    pending: Mutex<Vec<Transaction>>,
}

impl TransactionPool {
    /// Creates an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction and returns how many are now pending
    pub fn add(&self, transaction: Transaction) -> usize {
        let mut pending = self.lock();
        pending.push(transaction);
        pending.len()
    }

    /// Takes every pending transaction, in arrival order, leaving the pool empty
    pub fn drain_all(&self) -> Vec<Transaction> {
        std::mem::take(&mut *self.lock())
    }

    /// Copy of the pending transactions
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Transaction>> {
        // Mutations are a single push or take, so a poisoned vec is still whole.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
