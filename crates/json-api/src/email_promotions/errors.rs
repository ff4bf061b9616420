//! Email Promotion Errors

use salvo::http::StatusError;
use tracing::error;

use trellis_app::domain::email_promotions::EmailPromotionsServiceError;

pub(crate) fn into_status_error(error: EmailPromotionsServiceError) -> StatusError {
    match error {
        EmailPromotionsServiceError::OrderNotFound => {
            StatusError::not_found().brief("Order not found")
        }
        EmailPromotionsServiceError::OrderNotPaid(_) => {
            StatusError::bad_request().brief("Order not paid")
        }
        EmailPromotionsServiceError::ProjectNotFound => {
            StatusError::not_found().brief("Project not found")
        }
        EmailPromotionsServiceError::Forbidden => StatusError::forbidden(),
        EmailPromotionsServiceError::AlreadyTriggered => {
            StatusError::conflict().brief("A promotion was already triggered for this order")
        }
        EmailPromotionsServiceError::NoEntitlement => {
            StatusError::bad_request().brief("Order does not include an email promotion")
        }
        EmailPromotionsServiceError::NotFound => {
            StatusError::not_found().brief("Email promotion not found")
        }
        EmailPromotionsServiceError::InvalidReference
        | EmailPromotionsServiceError::MissingRequiredData
        | EmailPromotionsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid email promotion payload")
        }
        EmailPromotionsServiceError::Sql(source) => {
            error!("email promotion storage failed: {source}");

            StatusError::internal_server_error()
        }
    }
}
