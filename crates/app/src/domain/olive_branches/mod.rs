//! Olive Branches
//!
//! Invitations from a project creator to another user to join the project.
//! Sending one spends a quota credit.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::OliveBranchesServiceError;
pub use service::*;
