//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    orders::records::OrderStatus, payments::gateway::GatewayError,
    products::records::ProductUuid,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order has no items")]
    EmptyOrder,

    #[error("item quantity must be positive")]
    InvalidQuantity,

    #[error("item product is invalid")]
    InvalidProduct,

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error("order not found")]
    NotFound,

    #[error("order belongs to another user")]
    Forbidden,

    #[error("payer identity is required")]
    MissingPayerIdentity,

    #[error("cannot perform this action on an order that is {0}")]
    InvalidState(OrderStatus),

    #[error("order already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("payment gateway error")]
    Gateway(#[source] GatewayError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}

impl From<GatewayError> for OrdersServiceError {
    fn from(error: GatewayError) -> Self {
        Self::Gateway(error)
    }
}
