//! Project Records

use crate::{domain::users::records::UserUuid, uuids::TypedUuid};

/// Project UUID
pub type ProjectUuid = TypedUuid<ProjectRecord>;

/// Project Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub uuid: ProjectUuid,
    pub creator_uuid: UserUuid,
    pub name: String,
    pub description: String,
}
