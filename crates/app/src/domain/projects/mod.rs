//! Projects

pub mod records;
pub(crate) mod repository;
