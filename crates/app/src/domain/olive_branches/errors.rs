//! Olive branches service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::olive_branches::records::OliveBranchStatus;

#[derive(Debug, Error)]
pub enum OliveBranchesServiceError {
    #[error("receiver not found")]
    ReceiverNotFound,

    #[error("cannot send an olive branch to yourself")]
    SelfInvitation,

    #[error("project not found")]
    ProjectNotFound,

    #[error("not permitted")]
    Forbidden,

    #[error("an olive branch to this user is already pending")]
    AlreadyPending,

    #[error("no free or paid olive branches remaining")]
    InsufficientQuota,

    #[error("olive branch not found")]
    NotFound,

    #[error("olive branch was already {0}")]
    AlreadyHandled(OliveBranchStatus),

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OliveBranchesServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            // Only the pending-pair index is unique besides the primary key.
            Some(ErrorKind::UniqueViolation) => Self::AlreadyPending,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
