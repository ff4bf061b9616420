//! Received Olive Branches Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    extensions::*,
    olive_branches::{OliveBranchesResponse, errors::into_status_error},
    state::State,
};

/// Received Olive Branches Handler
///
/// Invitations addressed to the caller, newest first.
#[endpoint(tags("olive-branches"), summary = "List Received Olive Branches")]
pub(crate) async fn handler(
    page: QueryParam<u32, false>,
    size: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<OliveBranchesResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let page = page.into_page(size);

    let branches = state
        .app
        .olive_branches
        .list_received(user, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OliveBranchesResponse::new(branches, page)))
}
