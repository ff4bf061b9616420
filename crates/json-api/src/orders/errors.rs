//! Order Errors

use salvo::http::StatusError;
use tracing::error;

use trellis_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::EmptyOrder => StatusError::bad_request().brief("Order has no items"),
        OrdersServiceError::InvalidQuantity => {
            StatusError::bad_request().brief("Item quantity must be positive")
        }
        OrdersServiceError::InvalidProduct => {
            StatusError::bad_request().brief("Item product is invalid")
        }
        OrdersServiceError::ProductNotFound(product) => {
            StatusError::not_found().brief(format!("Product {product} not found"))
        }
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::Forbidden => StatusError::forbidden(),
        OrdersServiceError::MissingPayerIdentity => {
            StatusError::bad_request().brief("Payer identity is required")
        }
        OrdersServiceError::InvalidState(status) => {
            StatusError::bad_request().brief(format!("Cannot do that while the order is {status}"))
        }
        OrdersServiceError::AlreadyExists => StatusError::conflict().brief("Order already exists"),
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::Gateway(source) => {
            error!("payment gateway request failed: {source}");

            StatusError::internal_server_error()
        }
        OrdersServiceError::Sql(source) => {
            error!("order storage failed: {source}");

            StatusError::internal_server_error()
        }
    }
}
