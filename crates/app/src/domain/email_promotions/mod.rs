//! Email Promotions
//!
//! Paid email campaigns advertising a project to a random sample of users.
//! Triggering a promotion only records it; delivery happens on the
//! [`runner::CampaignRunner`].

pub mod campaign;
pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod runner;
pub mod service;
pub mod template;

pub use errors::EmailPromotionsServiceError;
pub use service::*;
