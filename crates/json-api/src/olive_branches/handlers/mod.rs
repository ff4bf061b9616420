//! Olive Branch Handlers

pub(crate) mod handle;
pub(crate) mod quota;
pub(crate) mod received;
pub(crate) mod send;
pub(crate) mod sent;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trellis_app::{domain::olive_branches::records::OliveBranchRecord, pagination::Page};

/// Olive Branch Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OliveBranchResponse {
    pub uuid: Uuid,
    pub sender_uuid: Uuid,
    pub receiver_uuid: Uuid,

    /// The project the receiver is invited to
    pub project_uuid: Uuid,

    /// Whether sending used a `free` or `paid` credit
    pub cost_type: String,

    /// One of `pending`, `accepted` or `rejected`
    pub status: String,

    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OliveBranchRecord> for OliveBranchResponse {
    fn from(branch: OliveBranchRecord) -> Self {
        Self {
            uuid: branch.uuid.into_uuid(),
            sender_uuid: branch.sender_uuid.into_uuid(),
            receiver_uuid: branch.receiver_uuid.into_uuid(),
            project_uuid: branch.project_uuid.into_uuid(),
            cost_type: branch.cost_type.as_str().to_string(),
            status: branch.status.to_string(),
            message: branch.message,
            created_at: branch.created_at.to_string(),
            updated_at: branch.updated_at.to_string(),
        }
    }
}

/// A page of olive branches
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OliveBranchesResponse {
    /// Newest first
    pub olive_branches: Vec<OliveBranchResponse>,

    pub page: u32,
    pub size: u32,
}

impl OliveBranchesResponse {
    fn new(branches: Vec<OliveBranchRecord>, page: Page) -> Self {
        Self {
            olive_branches: branches.into_iter().map(Into::into).collect(),
            page: page.page(),
            size: page.size(),
        }
    }
}
