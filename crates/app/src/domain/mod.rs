//! Trellis Domain Concerns

pub mod email_promotions;
pub mod olive_branches;
pub mod orders;
pub mod payments;
pub mod products;
pub mod projects;
pub mod quotas;
pub mod status;
pub mod unsubscribe;
pub mod users;
