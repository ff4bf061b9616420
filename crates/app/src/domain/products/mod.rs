//! Products
//!
//! The read-only catalog that orders snapshot prices and names from.

pub mod records;
pub(crate) mod repository;
