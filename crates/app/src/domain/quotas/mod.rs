//! Quotas
//!
//! Each user has a daily free allowance of invitations plus a durable paid
//! balance topped up by purchases.

pub mod ledger;
pub mod records;
pub(crate) mod repository;

pub use ledger::{CostType, DAILY_FREE_ALLOWANCE, QuotaExhausted};
