//! Service Entitlements Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    orders::records::{OrderItemRecord, OrderItemUuid, OrderUuid},
    payments::records::{ServiceEntitlementRecord, ServiceEntitlementUuid},
    products::records::ProductUuid,
    users::records::UserUuid,
};

const CREATE_ENTITLEMENT_SQL: &str = include_str!("sql/create_entitlement.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgEntitlementsRepository;

impl PgEntitlementsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_entitlement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: &OrderItemRecord,
    ) -> Result<ServiceEntitlementRecord, sqlx::Error> {
        let quantity = i32::try_from(item.quantity).map_err(|e| sqlx::Error::ColumnDecode {
            index: "quantity".to_string(),
            source: Box::new(e),
        })?;

        query_as::<Postgres, ServiceEntitlementRecord>(CREATE_ENTITLEMENT_SQL)
            .bind(ServiceEntitlementUuid::new().into_uuid())
            .bind(item.order_uuid.into_uuid())
            .bind(item.uuid.into_uuid())
            .bind(user.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(quantity)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ServiceEntitlementRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity: i32 = row.try_get("quantity")?;

        Ok(Self {
            uuid: ServiceEntitlementUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            order_item_uuid: OrderItemUuid::from_uuid(row.try_get("order_item_uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: u32::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
