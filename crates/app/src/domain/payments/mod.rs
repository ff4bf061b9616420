//! Payments
//!
//! Gateway notifications settle orders and fan out their benefits in one
//! transaction.

pub mod benefits;
pub mod errors;
pub mod gateway;
pub mod records;
mod repository;
pub mod service;
pub mod trade_number;

pub use errors::PaymentsServiceError;
pub use service::*;
