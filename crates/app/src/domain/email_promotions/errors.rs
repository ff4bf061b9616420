//! Email promotions service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::orders::records::OrderStatus;

#[derive(Debug, Error)]
pub enum EmailPromotionsServiceError {
    #[error("order not found")]
    OrderNotFound,

    #[error("order must be paid, found {0}")]
    OrderNotPaid(OrderStatus),

    #[error("project not found")]
    ProjectNotFound,

    #[error("not permitted")]
    Forbidden,

    #[error("a promotion was already triggered for this order")]
    AlreadyTriggered,

    #[error("order contains no email promotion entitlement")]
    NoEntitlement,

    #[error("email promotion not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for EmailPromotionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyTriggered,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
