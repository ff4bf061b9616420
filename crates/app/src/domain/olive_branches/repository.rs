//! Olive Branches Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    domain::{
        olive_branches::{
            data::NewOliveBranch,
            records::{OliveBranchRecord, OliveBranchStatus, OliveBranchUuid},
        },
        projects::records::ProjectUuid,
        quotas::CostType,
        status::decode_column,
        users::records::UserUuid,
    },
    pagination::Page,
};

const CREATE_OLIVE_BRANCH_SQL: &str = include_str!("sql/create_olive_branch.sql");
const GET_OLIVE_BRANCH_SQL: &str = include_str!("sql/get_olive_branch.sql");
const EXISTS_PENDING_BETWEEN_SQL: &str = include_str!("sql/exists_pending_between.sql");
const TRANSITION_STATUS_SQL: &str = include_str!("sql/transition_olive_branch_status.sql");
const LIST_RECEIVED_SQL: &str = include_str!("sql/list_received.sql");
const LIST_SENT_SQL: &str = include_str!("sql/list_sent.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOliveBranchesRepository;

impl PgOliveBranchesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_olive_branch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sender: UserUuid,
        branch: &NewOliveBranch,
        cost_type: CostType,
    ) -> Result<OliveBranchRecord, sqlx::Error> {
        query_as::<Postgres, OliveBranchRecord>(CREATE_OLIVE_BRANCH_SQL)
            .bind(OliveBranchUuid::new().into_uuid())
            .bind(sender.into_uuid())
            .bind(branch.receiver_uuid.into_uuid())
            .bind(branch.project_uuid.into_uuid())
            .bind(cost_type.as_str())
            .bind(branch.message.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_olive_branch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        branch: OliveBranchUuid,
    ) -> Result<Option<OliveBranchRecord>, sqlx::Error> {
        query_as::<Postgres, OliveBranchRecord>(GET_OLIVE_BRANCH_SQL)
            .bind(branch.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn exists_pending_between(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sender: UserUuid,
        receiver: UserUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(EXISTS_PENDING_BETWEEN_SQL)
            .bind(sender.into_uuid())
            .bind(receiver.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Move a branch from `from` to `to`, returning `None` if it was no longer in `from`.
    pub(crate) async fn transition_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        branch: OliveBranchUuid,
        from: OliveBranchStatus,
        to: OliveBranchStatus,
    ) -> Result<Option<OliveBranchRecord>, sqlx::Error> {
        query_as::<Postgres, OliveBranchRecord>(TRANSITION_STATUS_SQL)
            .bind(branch.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_received(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        receiver: UserUuid,
        page: Page,
    ) -> Result<Vec<OliveBranchRecord>, sqlx::Error> {
        query_as::<Postgres, OliveBranchRecord>(LIST_RECEIVED_SQL)
            .bind(receiver.into_uuid())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_sent(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sender: UserUuid,
        page: Page,
    ) -> Result<Vec<OliveBranchRecord>, sqlx::Error> {
        query_as::<Postgres, OliveBranchRecord>(LIST_SENT_SQL)
            .bind(sender.into_uuid())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OliveBranchRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OliveBranchUuid::from_uuid(row.try_get("uuid")?),
            sender_uuid: UserUuid::from_uuid(row.try_get("sender_uuid")?),
            receiver_uuid: UserUuid::from_uuid(row.try_get("receiver_uuid")?),
            project_uuid: ProjectUuid::from_uuid(row.try_get("project_uuid")?),
            cost_type: decode_column("cost_type", row.try_get::<&str, _>("cost_type")?)?,
            status: decode_column("status", row.try_get::<&str, _>("status")?)?,
            message: row.try_get("message")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
