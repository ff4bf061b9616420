//! Unsubscribe service errors.

use thiserror::Error;

use crate::domain::unsubscribe::TokenError;

#[derive(Debug, Error)]
pub enum UnsubscribeServiceError {
    #[error("invalid or expired unsubscribe link")]
    InvalidToken(#[source] TokenError),

    #[error("user not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}
