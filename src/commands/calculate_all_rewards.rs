use std::{
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{CustomerRewards, RewardWindow, Transaction},
    ports::transactions::TransactionsPort,
};
use chrono::NaiveDate;
use tower::Service;
use tracing::info;

use super::{DomainLogic, Error};

/// Request reward statements for every customer with eligible activity.
///
/// Customers without a single purchase inside the window do not appear in
/// the answer; an empty data source yields an empty list rather than an
/// error.
pub struct CalculateAllRewardsRequest {
    /// Reference date; the eligible window is the three complete months
    /// before the month containing it
    pub as_of: NaiveDate,
}

impl<T> Service<CalculateAllRewardsRequest> for DomainLogic<T>
where
    T: TransactionsPort + 'static,
{
    type Response = Vec<CustomerRewards>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CalculateAllRewardsRequest) -> Self::Future {
        let transactions = self.transactions.clone();
        Box::pin(async move {
            info!("calculating reward points for all customers");

            let window = RewardWindow::preceding(req.as_of).ok_or_else(|| {
                Error::InvalidState("reference date is out of calendar range".into())
            })?;

            // BTreeMap keys give a stable, ascending customer order
            let mut by_customer: BTreeMap<i64, Vec<Transaction>> = BTreeMap::new();
            for transaction in transactions.find_all_in_window(window).await? {
                by_customer
                    .entry(transaction.customer_id)
                    .or_default()
                    .push(transaction);
            }

            let rewards: Vec<CustomerRewards> = by_customer
                .into_iter()
                .map(|(customer_id, history)| {
                    CustomerRewards::from_transactions(customer_id, &history, window)
                })
                .collect();

            info!(
                customers = rewards.len(),
                "calculated reward points for all customers"
            );
            Ok(rewards)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase,
        domain::MonthlyPoints,
        ports::transactions::{Error as PortError, MockTransactionsPort},
    };
    use mockall::predicate::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};
    use uuid::Uuid;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn purchase(customer_id: i64, amount: f64, date: NaiveDate) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            customer_id,
            amount,
            date,
        }
    }

    fn month(name: &str, points: u32) -> MonthlyPoints {
        MonthlyPoints {
            month: name.to_string(),
            points,
        }
    }

    #[fixture]
    fn as_of() -> NaiveDate {
        day(2023, 10, 15)
    }

    /// Three customers' purchases spread over July, August, and September
    fn seeded_database() -> Result<MemoryDatabase, PortError> {
        let database = MemoryDatabase::default();
        for transaction in [
            purchase(101, 120.0, day(2023, 7, 10)),
            purchase(101, 75.0, day(2023, 8, 15)),
            purchase(101, 150.0, day(2023, 9, 5)),
            purchase(101, 200.0, day(2023, 9, 20)),
            purchase(101, 50.0, day(2023, 8, 25)),
            purchase(102, 90.0, day(2023, 7, 12)),
            purchase(102, 110.0, day(2023, 8, 18)),
            purchase(102, 130.0, day(2023, 8, 22)),
            purchase(102, 70.0, day(2023, 9, 10)),
            purchase(102, 85.0, day(2023, 9, 25)),
            purchase(103, 105.0, day(2023, 7, 14)),
            purchase(103, 115.0, day(2023, 8, 12)),
            purchase(103, 140.0, day(2023, 8, 28)),
            purchase(103, 60.0, day(2023, 9, 15)),
            purchase(103, 95.0, day(2023, 9, 27)),
        ] {
            database.record(transaction)?;
        }
        Ok(database)
    }

    #[rstest]
    #[tokio::test]
    async fn test_call(as_of: NaiveDate) -> Result<(), BoxError> {
        // GIVEN purchases for three customers across the window
        let database = seeded_database()?;
        let mut domain = DomainLogic::new(Arc::new(database));

        // WHEN calculating rewards for everyone
        let req = CalculateAllRewardsRequest { as_of };
        let res = ServiceExt::<CalculateAllRewardsRequest>::ready(&mut domain)
            .await?
            .call(req)
            .await;

        // THEN one statement per customer, ascending by id, months oldest
        // first
        assert_that!(res).is_ok().is_equal_to(vec![
            CustomerRewards {
                customer_id: 101,
                monthly_points: vec![
                    month("July", 90),
                    month("August", 25),
                    month("September", 400),
                ],
                total_points: 515,
            },
            CustomerRewards {
                customer_id: 102,
                monthly_points: vec![
                    month("July", 40),
                    month("August", 180),
                    month("September", 55),
                ],
                total_points: 275,
            },
            CustomerRewards {
                customer_id: 103,
                monthly_points: vec![
                    month("July", 60),
                    month("August", 210),
                    month("September", 55),
                ],
                total_points: 325,
            },
        ]);

        Ok(())
    }

    /// An empty data source is a success with an empty list, never an error
    #[rstest]
    #[tokio::test]
    async fn test_call_with_no_customers(as_of: NaiveDate) -> Result<(), BoxError> {
        let mut domain = DomainLogic::new(Arc::new(MemoryDatabase::default()));

        let req = CalculateAllRewardsRequest { as_of };
        let res = ServiceExt::<CalculateAllRewardsRequest>::ready(&mut domain)
            .await?
            .call(req)
            .await;

        assert_that!(res).is_ok().is_empty();

        Ok(())
    }

    /// The port is asked for exactly the three complete months before the
    /// reference date's month
    #[rstest]
    #[tokio::test]
    async fn test_call_queries_preceding_window(as_of: NaiveDate) -> Result<(), BoxError> {
        let mut transactions = MockTransactionsPort::new();
        transactions
            .expect_find_all_in_window()
            .times(1)
            .with(eq(RewardWindow::preceding(as_of).unwrap()))
            .returning(|_| Ok(vec![]));
        let mut domain = DomainLogic::new(Arc::new(transactions));

        let req = CalculateAllRewardsRequest { as_of };
        let res = ServiceExt::<CalculateAllRewardsRequest>::ready(&mut domain)
            .await?
            .call(req)
            .await;

        assert_that!(res).is_ok().is_empty();
        Arc::into_inner(domain.transactions).unwrap().checkpoint();

        Ok(())
    }

    /// Data-source failures pass through unchanged, with no retry
    #[rstest]
    #[tokio::test]
    async fn test_call_propagates_port_errors(as_of: NaiveDate) -> Result<(), BoxError> {
        let mut transactions = MockTransactionsPort::new();
        transactions
            .expect_find_all_in_window()
            .times(1)
            .returning(|_| Err(PortError::Adapter("connection reset".into())));
        let mut domain = DomainLogic::new(Arc::new(transactions));

        let req = CalculateAllRewardsRequest { as_of };
        let res = ServiceExt::<CalculateAllRewardsRequest>::ready(&mut domain)
            .await?
            .call(req)
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Transactions(PortError::Adapter(_))));

        Ok(())
    }
}
