//! Quota Ledger Repository

use jiff_sqlx::Date as SqlxDate;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::domain::{
    quotas::{ledger::QuotaLedger, records::QuotaLedgerRecord},
    users::records::UserUuid,
};

const ENSURE_LEDGER_SQL: &str = include_str!("sql/ensure_ledger.sql");
const LOCK_LEDGER_SQL: &str = include_str!("sql/lock_ledger.sql");
const GET_LEDGER_SQL: &str = include_str!("sql/get_ledger.sql");
const UPDATE_LEDGER_SQL: &str = include_str!("sql/update_ledger.sql");
const ADD_PAID_BALANCE_SQL: &str = include_str!("sql/add_paid_balance.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgQuotaLedgerRepository;

impl PgQuotaLedgerRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Create an empty ledger for `user` if none exists yet.
    pub(crate) async fn ensure_ledger(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<(), sqlx::Error> {
        query(ENSURE_LEDGER_SQL)
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Read the ledger and hold its row lock until the transaction ends.
    pub(crate) async fn lock_ledger(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<QuotaLedgerRecord, sqlx::Error> {
        query_as::<Postgres, QuotaLedgerRecord>(LOCK_LEDGER_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_ledger(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<QuotaLedgerRecord>, sqlx::Error> {
        query_as::<Postgres, QuotaLedgerRecord>(GET_LEDGER_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update_ledger(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        ledger: QuotaLedger,
    ) -> Result<(), sqlx::Error> {
        let paid_balance = i64::try_from(ledger.paid_balance).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "paid_balance".to_string(),
                source: Box::new(e),
            }
        })?;

        let free_used_today = i32::try_from(ledger.free_used_today).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "free_used_today".to_string(),
                source: Box::new(e),
            }
        })?;

        query(UPDATE_LEDGER_SQL)
            .bind(user.into_uuid())
            .bind(paid_balance)
            .bind(free_used_today)
            .bind(ledger.last_activity_date.map(SqlxDate::from))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Atomically credit `amount` paid invitations, creating the ledger if
    /// needed. Returns the new balance.
    pub(crate) async fn add_paid_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        amount: u64,
    ) -> Result<u64, sqlx::Error> {
        let amount = i64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
            index: "paid_balance".to_string(),
            source: Box::new(e),
        })?;

        let balance: i64 = query_scalar(ADD_PAID_BALANCE_SQL)
            .bind(user.into_uuid())
            .bind(amount)
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(balance).map_err(|e| sqlx::Error::ColumnDecode {
            index: "paid_balance".to_string(),
            source: Box::new(e),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for QuotaLedgerRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let paid_balance: i64 = row.try_get("paid_balance")?;
        let free_used_today: i32 = row.try_get("free_used_today")?;

        Ok(Self {
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            paid_balance: u64::try_from(paid_balance).map_err(|e| sqlx::Error::ColumnDecode {
                index: "paid_balance".to_string(),
                source: Box::new(e),
            })?,
            free_used_today: u32::try_from(free_used_today).map_err(|e| {
                sqlx::Error::ColumnDecode {
                    index: "free_used_today".to_string(),
                    source: Box::new(e),
                }
            })?,
            last_activity_date: row
                .try_get::<Option<SqlxDate>, _>("last_activity_date")?
                .map(SqlxDate::to_jiff),
        })
    }
}
