//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    domain::{
        orders::records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
        products::records::{ProductKind, ProductRecord, ProductUuid},
        status::decode_column,
        users::records::UserUuid,
    },
    pagination::Page,
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");
const TRANSITION_ORDER_STATUS_SQL: &str = include_str!("sql/transition_order_status.sql");
const MARK_ORDER_PAID_SQL: &str = include_str!("sql/mark_order_paid.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        user: UserUuid,
        total: u64,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(user.into_uuid())
            .bind(to_i64("total", total)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        position: usize,
        product: &ProductRecord,
        quantity: u32,
    ) -> Result<OrderItemRecord, sqlx::Error> {
        let position = i32::try_from(position).map_err(|e| sqlx::Error::ColumnDecode {
            index: "position".to_string(),
            source: Box::new(e),
        })?;

        let quantity = i32::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
            index: "quantity".to_string(),
            source: Box::new(e),
        })?;

        query_as::<Postgres, OrderItemRecord>(CREATE_ORDER_ITEM_SQL)
            .bind(OrderItemUuid::new().into_uuid())
            .bind(order.into_uuid())
            .bind(position)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(product.kind.as_str())
            .bind(to_i64("price", product.price)?)
            .bind(quantity)
            .fetch_one(&mut **tx)
            .await
    }

    /// Load an order together with its items.
    pub(crate) async fn find_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let Some(mut record) = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await?
        else {
            return Ok(None);
        };

        record.items = self.get_order_items(tx, &[order]).await?;

        Ok(Some(record))
    }

    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        let mut orders = query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(user.into_uuid())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();
        let mut items = self.get_order_items(tx, &uuids).await?;

        for order in &mut orders {
            let (mine, rest): (Vec<_>, Vec<_>) = items
                .into_iter()
                .partition(|item| item.order_uuid == order.uuid);

            order.items = mine;
            items = rest;
        }

        Ok(orders)
    }

    async fn get_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().map(|order| order.into_uuid()).collect();

        query_as::<Postgres, OrderItemRecord>(GET_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    /// Move an order from `from` to `to`. Returns the number of rows changed,
    /// which is zero when the order was no longer in `from`.
    pub(crate) async fn transition_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(TRANSITION_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Settle an unpaid order. Returns zero rows when it was already settled
    /// or cancelled.
    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        transaction_id: Option<&str>,
        paid_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_ORDER_PAID_SQL)
            .bind(order.into_uuid())
            .bind(transaction_id)
            .bind(SqlxTimestamp::from(paid_at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn to_i64(index: &str, value: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: Box::new(e),
    })
}

fn try_get_amount(row: &PgRow, index: &str) -> sqlx::Result<u64> {
    let value: i64 = row.try_get(index)?;

    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            total: try_get_amount(row, "total")?,
            status: decode_column("status", row.try_get::<&str, _>("status")?)?,
            transaction_id: row.try_get("transaction_id")?,
            paid_at: row
                .try_get::<Option<SqlxTimestamp>, _>("paid_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            items: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity: i32 = row.try_get("quantity")?;

        let quantity = u32::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
            index: "quantity".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            product_name: row.try_get("product_name")?,
            product_kind: ProductKind::from(row.try_get::<String, _>("product_kind")?),
            price: try_get_amount(row, "price")?,
            quantity,
        })
    }
}
