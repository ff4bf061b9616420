//! Olive Branch Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{
        projects::records::ProjectUuid, quotas::CostType, status::UnknownVariant,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Olive Branch UUID
pub type OliveBranchUuid = TypedUuid<OliveBranchRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OliveBranchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OliveBranchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Only pending invitations can be answered, and only once.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Pending, Self::Accepted | Self::Rejected))
    }
}

impl FromStr for OliveBranchStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for OliveBranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Olive Branch Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OliveBranchRecord {
    pub uuid: OliveBranchUuid,
    pub sender_uuid: UserUuid,
    pub receiver_uuid: UserUuid,
    pub project_uuid: ProjectUuid,
    pub cost_type: CostType,
    pub status: OliveBranchStatus,
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_answerable_state() {
        use OliveBranchStatus::{Accepted, Pending, Rejected};

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Pending));
    }
}
