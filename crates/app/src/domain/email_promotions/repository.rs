//! Email Promotions Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar,
};
use uuid::Uuid;

use crate::{
    domain::{
        email_promotions::{
            data::NewEmailPromotion,
            records::{EmailPromotionRecord, EmailPromotionUuid},
        },
        orders::records::OrderUuid,
        projects::records::ProjectUuid,
        status::decode_column,
        users::records::UserUuid,
    },
    pagination::Page,
};

const CREATE_EMAIL_PROMOTION_SQL: &str = include_str!("sql/create_email_promotion.sql");
const GET_EMAIL_PROMOTION_SQL: &str = include_str!("sql/get_email_promotion.sql");
const GET_EMAIL_PROMOTION_BY_ORDER_SQL: &str = include_str!("sql/get_email_promotion_by_order.sql");
const MARK_SENDING_SQL: &str = include_str!("sql/mark_sending.sql");
const MARK_COMPLETED_SQL: &str = include_str!("sql/mark_completed.sql");
const MARK_FAILED_SQL: &str = include_str!("sql/mark_failed.sql");
const LIST_BY_CREATOR_SQL: &str = include_str!("sql/list_by_creator.sql");
const LIST_PENDING_SQL: &str = include_str!("sql/list_pending.sql");
const FAIL_INTERRUPTED_SQL: &str = include_str!("sql/fail_interrupted.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgEmailPromotionsRepository;

impl PgEmailPromotionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_promotion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        creator: UserUuid,
        promotion: NewEmailPromotion,
        max_recipients: u32,
    ) -> Result<EmailPromotionRecord, sqlx::Error> {
        let max_recipients = i32::try_from(max_recipients).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "max_recipients".to_string(),
                source: Box::new(e),
            }
        })?;

        query_as::<Postgres, EmailPromotionRecord>(CREATE_EMAIL_PROMOTION_SQL)
            .bind(EmailPromotionUuid::new().into_uuid())
            .bind(promotion.order_uuid.into_uuid())
            .bind(promotion.project_uuid.into_uuid())
            .bind(creator.into_uuid())
            .bind(max_recipients)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_promotion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: EmailPromotionUuid,
    ) -> Result<Option<EmailPromotionRecord>, sqlx::Error> {
        query_as::<Postgres, EmailPromotionRecord>(GET_EMAIL_PROMOTION_SQL)
            .bind(promotion.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<EmailPromotionRecord>, sqlx::Error> {
        query_as::<Postgres, EmailPromotionRecord>(GET_EMAIL_PROMOTION_BY_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Claim a pending promotion for delivery. `None` if it was not pending.
    pub(crate) async fn mark_sending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: EmailPromotionUuid,
    ) -> Result<Option<EmailPromotionRecord>, sqlx::Error> {
        query_as::<Postgres, EmailPromotionRecord>(MARK_SENDING_SQL)
            .bind(promotion.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn mark_completed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: EmailPromotionUuid,
        total_sent: u32,
    ) -> Result<u64, sqlx::Error> {
        let total_sent = i32::try_from(total_sent).map_err(|e| sqlx::Error::ColumnDecode {
            index: "total_sent".to_string(),
            source: Box::new(e),
        })?;

        let rows_affected = query(MARK_COMPLETED_SQL)
            .bind(promotion.into_uuid())
            .bind(total_sent)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn mark_failed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: EmailPromotionUuid,
        message: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_FAILED_SQL)
            .bind(promotion.into_uuid())
            .bind(message)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Oldest pending promotions created at or before `created_before`.
    pub(crate) async fn list_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        created_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<EmailPromotionUuid>, sqlx::Error> {
        let uuids: Vec<Uuid> = query_scalar(LIST_PENDING_SQL)
            .bind(SqlxTimestamp::from(created_before))
            .bind(limit)
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(EmailPromotionUuid::from_uuid).collect())
    }

    /// Fail every promotion left in `sending`.
    pub(crate) async fn fail_interrupted(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        message: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(FAIL_INTERRUPTED_SQL)
            .bind(message)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn list_by_creator(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        creator: UserUuid,
        page: Page,
    ) -> Result<Vec<EmailPromotionRecord>, sqlx::Error> {
        query_as::<Postgres, EmailPromotionRecord>(LIST_BY_CREATOR_SQL)
            .bind(creator.into_uuid())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await
    }
}

fn decode_count(row: &PgRow, index: &str) -> sqlx::Result<u32> {
    let value: i32 = row.try_get(index)?;

    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for EmailPromotionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: EmailPromotionUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            project_uuid: ProjectUuid::from_uuid(row.try_get("project_uuid")?),
            creator_uuid: UserUuid::from_uuid(row.try_get("creator_uuid")?),
            max_recipients: decode_count(row, "max_recipients")?,
            total_sent: decode_count(row, "total_sent")?,
            status: decode_column("status", row.try_get::<&str, _>("status")?)?,
            error_message: row.try_get("error_message")?,
            started_at: row
                .try_get::<Option<SqlxTimestamp>, _>("started_at")?
                .map(SqlxTimestamp::to_jiff),
            completed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("completed_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
