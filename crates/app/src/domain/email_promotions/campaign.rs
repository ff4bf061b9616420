//! Campaign delivery.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::{
    database::Db,
    domain::{
        email_promotions::{
            records::{EmailPromotionRecord, EmailPromotionUuid},
            repository::PgEmailPromotionsRepository,
            template::PromotionRenderer,
        },
        projects::repository::PgProjectsRepository,
        unsubscribe::UnsubscribeSigner,
        users::repository::PgUsersRepository,
    },
    mail::MailTransport,
};

/// Pause between consecutive sends within one campaign.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(100);

pub(crate) const MAIL_NOT_CONFIGURED: &str = "mail transport is not configured";
pub(crate) const PROJECT_NOT_FOUND: &str = "project not found";
pub(crate) const INTERRUPTED: &str = "interrupted before completion";

/// How a campaign run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignOutcome {
    Completed { total_sent: u32 },
    Failed(String),

    /// The promotion was not pending, so another run owns it.
    Skipped,
}

/// Delivers one promotion end to end.
#[derive(Clone)]
pub struct Campaign {
    db: Db,
    promotions: PgEmailPromotionsRepository,
    projects: PgProjectsRepository,
    users: PgUsersRepository,
    mailer: Option<Arc<dyn MailTransport>>,
    renderer: PromotionRenderer,
    unsubscribe: UnsubscribeSigner,
    send_delay: Duration,
}

impl Campaign {
    #[must_use]
    pub fn new(
        db: Db,
        mailer: Option<Arc<dyn MailTransport>>,
        renderer: PromotionRenderer,
        unsubscribe: UnsubscribeSigner,
        send_delay: Duration,
    ) -> Self {
        Self {
            db,
            promotions: PgEmailPromotionsRepository::new(),
            projects: PgProjectsRepository::new(),
            users: PgUsersRepository::new(),
            mailer,
            renderer,
            unsubscribe,
            send_delay,
        }
    }

    /// Claim a pending promotion and mail it to up to `max_recipients` users.
    ///
    /// Individual send failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the promotion's own status could not be
    /// recorded.
    #[tracing::instrument(
        name = "email_promotions.campaign.run",
        skip(self),
        fields(email_promotion_uuid = %promotion),
        err
    )]
    pub async fn run(
        &self,
        promotion: EmailPromotionUuid,
    ) -> Result<CampaignOutcome, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let Some(record) = self.promotions.mark_sending(&mut tx, promotion).await? else {
            debug!(email_promotion_uuid = %promotion, "promotion is not pending");

            return Ok(CampaignOutcome::Skipped);
        };

        tx.commit().await?;

        let Some(mailer) = self.mailer.clone() else {
            return self.fail(promotion, MAIL_NOT_CONFIGURED).await;
        };

        match self.deliver(&record, mailer.as_ref()).await {
            Ok(total_sent) => {
                let mut tx = self.db.begin().await?;

                self.promotions
                    .mark_completed(&mut tx, promotion, total_sent)
                    .await?;

                tx.commit().await?;

                info!(
                    email_promotion_uuid = %promotion,
                    total_sent,
                    max_recipients = record.max_recipients,
                    "completed promotion"
                );

                Ok(CampaignOutcome::Completed { total_sent })
            }
            Err(message) => self.fail(promotion, &message).await,
        }
    }

    /// Returns the number of successful sends, or the reason the campaign
    /// could not start.
    async fn deliver(
        &self,
        record: &EmailPromotionRecord,
        mailer: &dyn MailTransport,
    ) -> Result<u32, String> {
        let mut tx = self.db.begin().await.map_err(|e| e.to_string())?;

        let project = self
            .projects
            .find_project(&mut tx, record.project_uuid)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| PROJECT_NOT_FOUND.to_string())?;

        let recipients = self
            .users
            .find_email_recipients(&mut tx, record.creator_uuid, record.max_recipients)
            .await
            .map_err(|e| e.to_string())?;

        tx.commit().await.map_err(|e| e.to_string())?;

        let mut total_sent = 0_u32;

        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }

            let token = self.unsubscribe.sign(recipient.uuid, Timestamp::now());
            let email = self.renderer.render(&project, &recipient.nickname, &token);

            match mailer.send(&recipient.email, &email.subject, &email.html).await {
                Ok(()) => total_sent += 1,
                Err(error) => warn!(
                    email_promotion_uuid = %record.uuid,
                    recipient_uuid = %recipient.uuid,
                    "failed to send promotion email: {error}"
                ),
            }
        }

        Ok(total_sent)
    }

    /// Fail every promotion left in `sending` by an earlier process.
    ///
    /// Recipients already mailed are not recorded, so these runs cannot be
    /// resumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn fail_interrupted(&self) -> Result<u64, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let failed = self.promotions.fail_interrupted(&mut tx, INTERRUPTED).await?;

        tx.commit().await?;

        Ok(failed)
    }

    /// Up to `limit` pending promotions created at or before `created_before`,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending(
        &self,
        created_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<EmailPromotionUuid>, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let pending = self
            .promotions
            .list_pending(&mut tx, created_before, limit)
            .await?;

        tx.commit().await?;

        Ok(pending)
    }

    async fn fail(
        &self,
        promotion: EmailPromotionUuid,
        message: &str,
    ) -> Result<CampaignOutcome, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        self.promotions.mark_failed(&mut tx, promotion, message).await?;

        tx.commit().await?;

        warn!(email_promotion_uuid = %promotion, reason = message, "promotion failed");

        Ok(CampaignOutcome::Failed(message.to_string()))
    }
}

impl Debug for Campaign {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Campaign")
            .field("db", &self.db)
            .field("mail_configured", &self.mailer.is_some())
            .field("send_delay", &self.send_delay)
            .finish_non_exhaustive()
    }
}
