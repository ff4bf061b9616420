//! Payments

pub(crate) mod notify;
