//! Per-transaction serialization.
//!
//! Every mutation of a transaction (container saves, incident changes, state
//! transitions) holds that transaction's lock for the whole database unit of
//! work, so two recomputes of the same totals never interleave. Different
//! transactions proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub(crate) struct TransactionLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TransactionLocks {
    pub(crate) async fn acquire(&self, transaction_id: Uuid) -> TransactionGuard {
        let lock = self
            .inner
            .entry(transaction_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        TransactionGuard {
            transaction_id,
            guard: Some(lock.lock_owned().await),
            locks: self.clone(),
        }
    }

    fn release(&self, transaction_id: Uuid) {
        // the map holds one reference; anything above it is a holder or waiter
        self.inner
            .remove_if(&transaction_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Held for the duration of one unit of work on a transaction.
#[derive(Debug)]
pub(crate) struct TransactionGuard {
    transaction_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: TransactionLocks,
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release(self.transaction_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_transaction_is_serialized() {
        let locks = TransactionLocks::default();
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = other.acquire(id).await;
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn different_transactions_do_not_block() {
        let locks = TransactionLocks::default();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let _b = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn idle_locks_are_forgotten() {
        let locks = TransactionLocks::default();
        let held = Uuid::new_v4();
        let _guard = locks.acquire(held).await;
        drop(locks.acquire(Uuid::new_v4()).await);

        assert_eq!(locks.len(), 1);
    }
}
