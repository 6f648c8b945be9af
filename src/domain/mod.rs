use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;
use uuid::Uuid;

/// Number of complete calendar months that count toward rewards.
pub const ELIGIBLE_WINDOW_MONTHS: u32 = 3;

/// A single purchase made by a customer.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    /// Unique identifier for the `Transaction`
    ///
    /// Assigned by the system that recorded the purchase; carried here so
    /// scoring can be traced back to its source.
    pub id: Uuid,
    /// Customer the purchase belongs to
    ///
    /// Customer identifiers are issued by the retail platform and are always
    /// positive.
    pub customer_id: i64,
    /// Purchase amount in the retailer's currency unit
    pub amount: f64,
    /// Calendar day of the purchase; the time of day never matters
    pub date: NaiveDate,
}

/// Reward points earned by a single purchase.
///
/// One point per whole currency unit spent between 50 and 100, plus two
/// points per whole unit above 100. Each tier truncates toward zero after
/// its own subtraction, so `120.0` earns `(120 - 100) * 2 + 50 = 90` and
/// `75.0` earns `25`. Negative amounts are a caller contract violation and
/// fall through both tier guards, earning zero.
pub fn reward_points(amount: f64) -> u32 {
    if amount > 100.0 {
        ((amount - 100.0) * 2.0) as u32 + 50
    } else if amount > 50.0 {
        (amount - 50.0) as u32
    } else {
        0
    }
}

/// Span of complete calendar months whose purchases count toward rewards.
///
/// Both bounds are inclusive. The month containing the reference date is
/// still in progress and is never part of the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl RewardWindow {
    /// The three complete months immediately before the month of `as_of`.
    pub fn preceding(as_of: NaiveDate) -> Option<Self> {
        Self::trailing_months(as_of, ELIGIBLE_WINDOW_MONTHS)
    }

    /// The `months` complete months immediately before the month of `as_of`.
    ///
    /// Returns `None` only when the window would fall outside the range of
    /// dates chrono can represent.
    pub fn trailing_months(as_of: NaiveDate, months: u32) -> Option<Self> {
        let first_of_current = as_of.with_day(1)?;

        Some(Self {
            start: first_of_current.checked_sub_months(Months::new(months))?,
            end: first_of_current.pred_opt()?,
        })
    }

    /// Whether `date` falls inside the window, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// First calendar day inside the window.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last calendar day inside the window.
    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Points a customer earned in one calendar month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlyPoints {
    /// Full English month name, e.g. "September"
    pub month: String,
    /// Points earned across that month's eligible purchases
    pub points: u32,
}

/// Reward points for one customer over an eligible window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerRewards {
    pub customer_id: i64,
    /// One entry per calendar month with eligible purchases, oldest first
    pub monthly_points: Vec<MonthlyPoints>,
    /// Sum of all entries in `monthly_points`
    pub total_points: u32,
}

impl CustomerRewards {
    /// Scores `transactions` against `window` and rolls them up per month.
    ///
    /// Purchases outside the window are ignored. Buckets are keyed by year
    /// and month, so the same month name in different years stays separate,
    /// and the entries come out oldest to newest. A month whose purchases
    /// all score zero still gets an entry; a customer with no eligible
    /// purchases at all gets an empty entry list and a zero total.
    pub fn from_transactions(
        customer_id: i64,
        transactions: &[Transaction],
        window: RewardWindow,
    ) -> Self {
        let mut buckets: BTreeMap<(i32, u32), MonthlyPoints> = BTreeMap::new();

        for transaction in transactions.iter().filter(|t| window.contains(t.date)) {
            let points = reward_points(transaction.amount);
            debug!(
                transaction_id = %transaction.id,
                amount = transaction.amount,
                points,
                "scored transaction"
            );

            buckets
                .entry((transaction.date.year(), transaction.date.month()))
                .or_insert_with(|| MonthlyPoints {
                    month: transaction.date.format("%B").to_string(),
                    points: 0,
                })
                .points += points;
        }

        let monthly_points: Vec<MonthlyPoints> = buckets.into_values().collect();
        let total_points = monthly_points.iter().map(|entry| entry.points).sum();

        Self {
            customer_id,
            monthly_points,
            total_points,
        }
    }
}
