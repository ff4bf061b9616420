//! Unsubscribe
//!
//! Signed links that let a promotion recipient opt out of further emails.

pub mod errors;
pub mod service;
pub mod token;

pub use errors::UnsubscribeServiceError;
pub use service::*;
pub use token::{TokenError, UnsubscribeSigner};
