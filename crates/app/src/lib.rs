//! Commerce core for the project collaboration marketplace: orders, payment
//! settlement, invitation quotas and email promotion campaigns.

pub mod context;
pub mod database;
pub mod domain;
pub mod mail;
pub mod pagination;
pub mod signing;

#[cfg(test)]
mod test;

mod uuids;
