//! Email Promotions Service

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info, warn};

use crate::{
    database::Db,
    domain::{
        email_promotions::{
            EmailPromotionsServiceError,
            data::{NewEmailPromotion, TriggeredPromotion},
            records::{EmailPromotionRecord, EmailPromotionUuid},
            repository::PgEmailPromotionsRepository,
            runner::CampaignScheduler,
        },
        orders::{
            records::{OrderItemRecord, OrderStatus},
            repository::PgOrdersRepository,
        },
        products::records::ProductKind,
        projects::repository::PgProjectsRepository,
        users::records::UserUuid,
    },
    pagination::Page,
};

#[derive(Clone)]
pub struct PgEmailPromotionsService {
    db: Db,
    promotions: PgEmailPromotionsRepository,
    orders: PgOrdersRepository,
    projects: PgProjectsRepository,
    scheduler: Arc<dyn CampaignScheduler>,
}

impl PgEmailPromotionsService {
    #[must_use]
    pub fn new(db: Db, scheduler: Arc<dyn CampaignScheduler>) -> Self {
        Self {
            db,
            promotions: PgEmailPromotionsRepository::new(),
            orders: PgOrdersRepository::new(),
            projects: PgProjectsRepository::new(),
            scheduler,
        }
    }
}

impl Debug for PgEmailPromotionsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgEmailPromotionsService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmailPromotionsService for PgEmailPromotionsService {
    #[tracing::instrument(
        name = "email_promotions.service.trigger_promotion",
        skip(self, promotion),
        fields(
            user_uuid = %user,
            order_uuid = %promotion.order_uuid,
            project_uuid = %promotion.project_uuid,
            email_promotion_uuid = tracing::field::Empty,
            max_recipients = tracing::field::Empty
        ),
        err
    )]
    async fn trigger_promotion(
        &self,
        user: UserUuid,
        promotion: NewEmailPromotion,
    ) -> Result<TriggeredPromotion, EmailPromotionsServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self
            .orders
            .find_order(&mut tx, promotion.order_uuid)
            .await?
            .ok_or(EmailPromotionsServiceError::OrderNotFound)?;

        if order.user_uuid != user {
            return Err(EmailPromotionsServiceError::Forbidden);
        }

        if order.status != OrderStatus::Paid {
            return Err(EmailPromotionsServiceError::OrderNotPaid(order.status));
        }

        let project = self
            .projects
            .find_project(&mut tx, promotion.project_uuid)
            .await?
            .ok_or(EmailPromotionsServiceError::ProjectNotFound)?;

        if project.creator_uuid != user {
            return Err(EmailPromotionsServiceError::Forbidden);
        }

        if self
            .promotions
            .find_by_order(&mut tx, promotion.order_uuid)
            .await?
            .is_some()
        {
            return Err(EmailPromotionsServiceError::AlreadyTriggered);
        }

        let max_recipients =
            entitled_recipients(&order.items).ok_or(EmailPromotionsServiceError::InvalidData)?;

        if max_recipients == 0 {
            return Err(EmailPromotionsServiceError::NoEntitlement);
        }

        let record = self
            .promotions
            .create_promotion(&mut tx, user, promotion, max_recipients)
            .await?;

        tx.commit().await?;

        let span = Span::current();

        span.record("email_promotion_uuid", tracing::field::display(record.uuid));
        span.record("max_recipients", max_recipients);

        info!(
            email_promotion_uuid = %record.uuid,
            max_recipients,
            "triggered email promotion"
        );

        // A refused row stays pending until the runner's next sweep.
        if let Err(source) = self.scheduler.schedule(record.uuid) {
            warn!(email_promotion_uuid = %record.uuid, "failed to queue campaign: {source}");
        }

        Ok(TriggeredPromotion {
            uuid: record.uuid,
            max_recipients,
        })
    }

    #[tracing::instrument(
        name = "email_promotions.service.get_status",
        skip(self),
        fields(user_uuid = %user, email_promotion_uuid = %promotion),
        err
    )]
    async fn get_status(
        &self,
        user: UserUuid,
        promotion: EmailPromotionUuid,
    ) -> Result<EmailPromotionRecord, EmailPromotionsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .promotions
            .find_promotion(&mut tx, promotion)
            .await?
            .ok_or(EmailPromotionsServiceError::NotFound)?;

        tx.commit().await?;

        if record.creator_uuid != user {
            return Err(EmailPromotionsServiceError::Forbidden);
        }

        Ok(record)
    }

    #[tracing::instrument(
        name = "email_promotions.service.list_by_creator",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn list_by_creator(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<EmailPromotionRecord>, EmailPromotionsServiceError> {
        let mut tx = self.db.begin().await?;

        let promotions = self.promotions.list_by_creator(&mut tx, user, page).await?;

        tx.commit().await?;

        Ok(promotions)
    }
}

/// Total recipients bought across the order's service entitlement lines.
fn entitled_recipients(items: &[OrderItemRecord]) -> Option<u32> {
    items
        .iter()
        .filter(|item| item.product_kind == ProductKind::ServiceEntitlement)
        .try_fold(0_u32, |total, item| total.checked_add(item.quantity))
}

#[automock]
#[async_trait]
pub trait EmailPromotionsService: Send + Sync {
    /// Record a promotion paid for by one of the user's orders and queue it
    /// for delivery. Returns as soon as the promotion is recorded.
    async fn trigger_promotion(
        &self,
        user: UserUuid,
        promotion: NewEmailPromotion,
    ) -> Result<TriggeredPromotion, EmailPromotionsServiceError>;

    async fn get_status(
        &self,
        user: UserUuid,
        promotion: EmailPromotionUuid,
    ) -> Result<EmailPromotionRecord, EmailPromotionsServiceError>;

    /// The user's promotions, newest first.
    async fn list_by_creator(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<EmailPromotionRecord>, EmailPromotionsServiceError>;
}
