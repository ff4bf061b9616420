//! Send Olive Branch Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trellis_app::domain::olive_branches::data::NewOliveBranch;

use crate::{
    extensions::*,
    olive_branches::{OliveBranchResponse, errors::into_status_error},
    state::State,
};

/// Send Olive Branch Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SendOliveBranchRequest {
    /// The user to invite
    pub receiver_uuid: Uuid,

    /// One of the caller's projects
    pub project_uuid: Uuid,

    pub message: Option<String>,
}

impl From<SendOliveBranchRequest> for NewOliveBranch {
    fn from(request: SendOliveBranchRequest) -> Self {
        NewOliveBranch {
            receiver_uuid: request.receiver_uuid.into(),
            project_uuid: request.project_uuid.into(),
            message: request
                .message
                .map(|message| message.trim().to_string())
                .filter(|message| !message.is_empty()),
        }
    }
}

/// Send Olive Branch Handler
///
/// Invites another user to one of the caller's projects. Each day's first
/// five invitations are free; after that each one spends a paid credit.
#[endpoint(
    tags("olive-branches"),
    summary = "Send Olive Branch",
    responses(
        (status_code = StatusCode::CREATED, description = "Olive branch sent"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "No invitations remaining"),
        (status_code = StatusCode::FORBIDDEN, description = "Project belongs to another user"),
        (status_code = StatusCode::CONFLICT, description = "Invitation already pending"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<SendOliveBranchRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OliveBranchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let branch = state
        .app
        .olive_branches
        .send_olive_branch(user, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(branch.into()))
}
