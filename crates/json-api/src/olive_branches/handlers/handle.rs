//! Handle Olive Branch Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trellis_app::domain::olive_branches::data::OliveBranchAction;

use crate::{
    extensions::*,
    olive_branches::{OliveBranchResponse, errors::into_status_error},
    state::State,
};

/// Handle Olive Branch Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct HandleOliveBranchRequest {
    /// `accept` or `reject`
    pub action: String,
}

/// Handle Olive Branch Handler
///
/// Accepts or rejects a pending invitation addressed to the caller.
#[endpoint(
    tags("olive-branches"),
    summary = "Handle Olive Branch",
    responses(
        (status_code = StatusCode::OK, description = "Olive branch answered"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid action or already answered"),
        (status_code = StatusCode::FORBIDDEN, description = "Addressed to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Olive branch not found"),
    ),
)]
pub(crate) async fn handler(
    branch: PathParam<Uuid>,
    json: JsonBody<HandleOliveBranchRequest>,
    depot: &mut Depot,
) -> Result<Json<OliveBranchResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let action: OliveBranchAction = json
        .into_inner()
        .action
        .trim()
        .parse()
        .map_err(|_ignored| StatusError::bad_request().brief("Invalid action"))?;

    let branch = state
        .app
        .olive_branches
        .handle_olive_branch(user, branch.into_inner().into(), action)
        .await
        .map_err(into_status_error)?;

    Ok(Json(branch.into()))
}
