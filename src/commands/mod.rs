use std::{borrow::Cow, sync::Arc};

pub mod calculate_all_rewards;
pub mod calculate_rewards;

pub struct DomainLogic<T> {
    transactions: Arc<T>,
}

impl<T> DomainLogic<T> {
    pub fn new(transactions: Arc<T>) -> Self {
        Self { transactions }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("transactions port error: {0:?}")]
    Transactions(#[from] crate::ports::transactions::Error),

    #[error("customer id {0} must be a positive value greater than zero")]
    InvalidCustomerId(i64),
    #[error("customer {0} has no transactions in the last three months")]
    NoTransactionsInWindow(i64),

    #[error("invalid state")]
    InvalidState(Cow<'static, str>),
}
