//! Reward-point calculation for retail customers.
//!
//! Purchases are scored with a tiered formula and rolled up per calendar
//! month over the three complete months before a reference date. Data access
//! goes through [`ports::transactions::TransactionsPort`]; the calculations
//! themselves are exposed as [`tower::Service`] implementations on
//! [`commands::DomainLogic`].

pub mod adapters;
pub mod commands;
pub mod domain;
pub mod ports;
