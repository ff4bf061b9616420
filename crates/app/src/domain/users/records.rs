//! User Records

use crate::uuids::TypedUuid;

/// User UUID
pub type UserUuid = TypedUuid<UserRecord>;

/// User Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uuid: UserUuid,
    pub nickname: String,
    pub email: Option<String>,
    pub email_opt_out: bool,
}

/// A user eligible to receive a promotion email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRecipient {
    pub uuid: UserUuid,
    pub nickname: String,
    pub email: String,
}
