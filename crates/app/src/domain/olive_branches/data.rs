//! Olive Branch Data

use std::str::FromStr;

use crate::domain::{
    olive_branches::records::OliveBranchStatus, projects::records::ProjectUuid,
    status::UnknownVariant, users::records::UserUuid,
};

/// New Olive Branch Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOliveBranch {
    pub receiver_uuid: UserUuid,
    pub project_uuid: ProjectUuid,
    pub message: Option<String>,
}

/// A receiver's answer to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OliveBranchAction {
    Accept,
    Reject,
}

impl OliveBranchAction {
    #[must_use]
    pub fn resulting_status(self) -> OliveBranchStatus {
        match self {
            Self::Accept => OliveBranchStatus::Accepted,
            Self::Reject => OliveBranchStatus::Rejected,
        }
    }
}

impl FromStr for OliveBranchAction {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("accept") {
            Ok(Self::Accept)
        } else if value.eq_ignore_ascii_case("reject") {
            Ok(Self::Reject)
        } else {
            Err(UnknownVariant(value.to_string()))
        }
    }
}
