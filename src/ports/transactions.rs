use crate::domain::{RewardWindow, Transaction};

#[mockall::automock]
#[async_trait::async_trait]
pub trait TransactionsPort {
    /// Every transaction recorded for the customer, in no particular order.
    ///
    /// A customer unknown to the data source simply comes back empty; at
    /// this layer that is indistinguishable from a known customer with no
    /// purchases, and both are treated the same.
    async fn find_by_customer_id(&self, customer_id: i64) -> Result<Vec<Transaction>, Error>;

    /// Every transaction dated inside `window`, across all customers.
    async fn find_all_in_window(&self, window: RewardWindow) -> Result<Vec<Transaction>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    ///
    /// Anything that goes wrong below the port rather than in the domain
    /// model, such as connectivity, configuration, or permission failures.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
