use crate::{
    domain::{RewardWindow, Transaction},
    ports::transactions::{Error, TransactionsPort},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// Transaction store backed by a shared in-process map.
///
/// Stands in for the real transaction database in tests and local wiring.
#[derive(Clone, Debug)]
pub struct MemoryDatabase {
    transactions: Arc<Mutex<HashMap<i64, Vec<Transaction>>>>,
}

impl MemoryDatabase {
    /// Stores one transaction under its customer.
    ///
    /// The port itself is read-only, so seeding goes through the adapter
    /// directly.
    pub fn record(&self, transaction: Transaction) -> Result<(), Error> {
        self.transactions
            .lock()?
            .entry(transaction.customer_id)
            .or_default()
            .push(transaction);

        Ok(())
    }
}

#[async_trait::async_trait]
impl TransactionsPort for MemoryDatabase {
    async fn find_by_customer_id(&self, customer_id: i64) -> Result<Vec<Transaction>, Error> {
        let transactions = self
            .transactions
            .lock()?
            .get(&customer_id)
            .cloned()
            .unwrap_or_default();

        Ok(transactions)
    }

    async fn find_all_in_window(&self, window: RewardWindow) -> Result<Vec<Transaction>, Error> {
        let transactions = self
            .transactions
            .lock()?
            .values()
            .flatten()
            .filter(|transaction| window.contains(transaction.date))
            .cloned()
            .collect();

        Ok(transactions)
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self {
            transactions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// [`PoisonError`] with the guard stripped off
///
/// `PoisonError` holds the `MutexGuard` internally, which is not `Send`, so
/// only its string representation crosses the port boundary.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

/// A `From` implementation for an error that only this adapter can produce.
impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
