//! Olive Branch Errors

use salvo::http::StatusError;
use tracing::error;

use trellis_app::domain::olive_branches::OliveBranchesServiceError;

pub(crate) fn into_status_error(error: OliveBranchesServiceError) -> StatusError {
    match error {
        OliveBranchesServiceError::ReceiverNotFound => {
            StatusError::bad_request().brief("Receiver not found")
        }
        OliveBranchesServiceError::SelfInvitation => {
            StatusError::bad_request().brief("Cannot send an olive branch to yourself")
        }
        OliveBranchesServiceError::ProjectNotFound => {
            StatusError::not_found().brief("Project not found")
        }
        OliveBranchesServiceError::Forbidden => StatusError::forbidden(),
        OliveBranchesServiceError::AlreadyPending => {
            StatusError::conflict().brief("An olive branch to this user is already pending")
        }
        OliveBranchesServiceError::InsufficientQuota => StatusError::payment_required()
            .brief("No olive branches remaining today; buy more to keep sending"),
        OliveBranchesServiceError::NotFound => {
            StatusError::not_found().brief("Olive branch not found")
        }
        OliveBranchesServiceError::AlreadyHandled(status) => {
            StatusError::bad_request().brief(format!("Olive branch was already {status}"))
        }
        OliveBranchesServiceError::InvalidReference
        | OliveBranchesServiceError::MissingRequiredData
        | OliveBranchesServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid olive branch payload")
        }
        OliveBranchesServiceError::Sql(source) => {
            error!("olive branch storage failed: {source}");

            StatusError::internal_server_error()
        }
    }
}
