//! Payments service errors.

use thiserror::Error;

use crate::domain::payments::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("notification failed verification")]
    InvalidSignature(#[source] GatewayError),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}
