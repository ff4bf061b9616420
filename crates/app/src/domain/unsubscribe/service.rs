//! Unsubscribe Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        unsubscribe::{UnsubscribeServiceError, UnsubscribeSigner},
        users::{records::UserUuid, repository::PgUsersRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgUnsubscribeService {
    db: Db,
    users: PgUsersRepository,
    signer: UnsubscribeSigner,
}

impl PgUnsubscribeService {
    #[must_use]
    pub fn new(db: Db, signer: UnsubscribeSigner) -> Self {
        Self {
            db,
            users: PgUsersRepository::new(),
            signer,
        }
    }
}

#[async_trait]
impl UnsubscribeService for PgUnsubscribeService {
    #[tracing::instrument(
        name = "unsubscribe.service.unsubscribe",
        skip(self, token),
        fields(user_uuid = tracing::field::Empty),
        err
    )]
    async fn unsubscribe(&self, token: &str) -> Result<UserUuid, UnsubscribeServiceError> {
        let user = self
            .signer
            .verify(token, Timestamp::now())
            .map_err(UnsubscribeServiceError::InvalidToken)?;

        Span::current().record("user_uuid", tracing::field::display(user));

        let mut tx = self.db.begin().await?;

        let rows_affected = self.users.set_email_opt_out(&mut tx, user, true).await?;

        if rows_affected == 0 {
            return Err(UnsubscribeServiceError::NotFound);
        }

        tx.commit().await?;

        info!(user_uuid = %user, "user unsubscribed from promotion emails");

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait UnsubscribeService: Send + Sync {
    /// Opt the token's user out of promotion emails. Idempotent.
    async fn unsubscribe(&self, token: &str) -> Result<UserUuid, UnsubscribeServiceError>;
}
