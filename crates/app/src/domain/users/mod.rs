//! Users
//!
//! Accounts are managed elsewhere on the platform. This module only reads
//! profiles, selects promotion recipients and records email opt-outs.

pub mod records;
pub(crate) mod repository;
