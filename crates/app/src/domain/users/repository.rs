//! Users Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::users::records::{EmailRecipient, UserRecord, UserUuid};

const GET_USER_SQL: &str = include_str!("sql/get_user.sql");
const FIND_EMAIL_RECIPIENTS_SQL: &str = include_str!("sql/find_email_recipients.sql");
const SET_EMAIL_OPT_OUT_SQL: &str = include_str!("sql/set_email_opt_out.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        query_as::<Postgres, UserRecord>(GET_USER_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Randomly sample up to `limit` opted-in users with an email address,
    /// never including `excluding`.
    pub(crate) async fn find_email_recipients(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        excluding: UserUuid,
        limit: u32,
    ) -> Result<Vec<EmailRecipient>, sqlx::Error> {
        query_as::<Postgres, EmailRecipient>(FIND_EMAIL_RECIPIENTS_SQL)
            .bind(excluding.into_uuid())
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn set_email_opt_out(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        opt_out: bool,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_EMAIL_OPT_OUT_SQL)
            .bind(user.into_uuid())
            .bind(opt_out)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: UserUuid::from_uuid(row.try_get("uuid")?),
            nickname: row.try_get("nickname")?,
            email: row.try_get("email")?,
            email_opt_out: row.try_get("email_opt_out")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for EmailRecipient {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: UserUuid::from_uuid(row.try_get("uuid")?),
            nickname: row.try_get("nickname")?,
            email: row.try_get("email")?,
        })
    }
}
