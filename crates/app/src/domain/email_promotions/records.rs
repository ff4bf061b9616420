//! Email Promotion Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{
        orders::records::OrderUuid, projects::records::ProjectUuid, status::UnknownVariant,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Email Promotion UUID
pub type EmailPromotionUuid = TypedUuid<EmailPromotionRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionStatus {
    Pending,
    Sending,
    Completed,
    Failed,
}

impl PromotionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sending => "sending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Sending) | (Self::Sending, Self::Completed | Self::Failed)
        )
    }
}

impl FromStr for PromotionStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "sending" => Ok(Self::Sending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email Promotion Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPromotionRecord {
    pub uuid: EmailPromotionUuid,
    pub order_uuid: OrderUuid,
    pub project_uuid: ProjectUuid,
    pub creator_uuid: UserUuid,
    pub max_recipients: u32,
    pub total_sent: u32,
    pub status: PromotionStatus,
    pub error_message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_moves_forward_only() {
        use PromotionStatus::{Completed, Failed, Pending, Sending};

        assert!(Pending.can_transition_to(Sending));
        assert!(Sending.can_transition_to(Completed));
        assert!(Sending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Sending));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn status_parses_stored_values() {
        assert_eq!("sending".parse(), Ok(PromotionStatus::Sending));
        assert!("SENDING".parse::<PromotionStatus>().is_err());
    }
}
