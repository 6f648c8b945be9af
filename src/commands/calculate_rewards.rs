use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{CustomerRewards, RewardWindow},
    ports::transactions::TransactionsPort,
};
use chrono::NaiveDate;
use tower::Service;
use tracing::{error, info};

use super::{DomainLogic, Error};

/// Request one customer's reward statement.
pub struct CalculateRewardsRequest {
    /// Customer to calculate rewards for; must be positive
    pub customer_id: i64,
    /// Reference date; the eligible window is the three complete months
    /// before the month containing it
    pub as_of: NaiveDate,
}

impl<T> Service<CalculateRewardsRequest> for DomainLogic<T>
where
    T: TransactionsPort + 'static,
{
    type Response = CustomerRewards;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CalculateRewardsRequest) -> Self::Future {
        let transactions = self.transactions.clone();
        Box::pin(async move {
            // Reject bad identifiers before touching the data source
            if req.customer_id <= 0 {
                error!(customer_id = req.customer_id, "invalid customer id");
                return Err(Error::InvalidCustomerId(req.customer_id));
            }
            info!(customer_id = req.customer_id, "calculating reward points");

            let window = RewardWindow::preceding(req.as_of).ok_or_else(|| {
                Error::InvalidState("reference date is out of calendar range".into())
            })?;

            // Fetch the full history; windowing happens during the rollup
            let history = transactions.find_by_customer_id(req.customer_id).await?;
            let rewards = CustomerRewards::from_transactions(req.customer_id, &history, window);

            // An empty rollup means no eligible activity at all, not a
            // zero-point total
            if rewards.monthly_points.is_empty() {
                error!(
                    customer_id = req.customer_id,
                    "no transactions in the eligible window"
                );
                return Err(Error::NoTransactionsInWindow(req.customer_id));
            }

            info!(
                customer_id = req.customer_id,
                total_points = rewards.total_points,
                "calculated reward points"
            );
            Ok(rewards)
        })
    }
}
