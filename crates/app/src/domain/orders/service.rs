//! Orders Service

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        orders::{
            OrdersServiceError,
            data::NewOrder,
            records::{OrderRecord, OrderStatus, OrderUuid},
            repository::PgOrdersRepository,
        },
        payments::{
            gateway::{ClientPaymentParams, PaymentGateway, PrepayRequest},
            trade_number::trade_number_for,
        },
        products::repository::PgProductsRepository,
        users::records::UserUuid,
    },
    pagination::Page,
};

/// Payment description used when an order has no named items.
pub const DEFAULT_PAYMENT_DESCRIPTION: &str = "Marketplace order";

#[derive(Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    products: PgProductsRepository,
    gateway: Arc<dyn PaymentGateway>,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            products: PgProductsRepository::new(),
            gateway,
        }
    }

    async fn owned_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .orders
            .find_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        tx.commit().await?;

        if record.user_uuid != user {
            return Err(OrdersServiceError::Forbidden);
        }

        Ok(record)
    }
}

impl Debug for PgOrdersService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgOrdersService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            user_uuid = %user,
            order_uuid = tracing::field::Empty,
            item_count = order.items.len(),
            total = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::EmptyOrder);
        }

        for item in &order.items {
            if item.quantity == 0 {
                return Err(OrdersServiceError::InvalidQuantity);
            }

            if item.product_uuid.into_uuid().is_nil() {
                return Err(OrdersServiceError::InvalidProduct);
            }
        }

        let mut tx = self.db.begin().await?;

        let mut lines = Vec::with_capacity(order.items.len());

        for item in &order.items {
            let product = self
                .products
                .find_product(&mut tx, item.product_uuid)
                .await?
                .ok_or(OrdersServiceError::ProductNotFound(item.product_uuid))?;

            lines.push((product, item.quantity));
        }

        let total = order_total(lines.iter().map(|(product, quantity)| (product.price, *quantity)))
            .ok_or(OrdersServiceError::InvalidData)?;

        let mut record = self
            .orders
            .create_order(&mut tx, OrderUuid::new(), user, total)
            .await?;

        for (position, (product, quantity)) in lines.iter().enumerate() {
            let item = self
                .orders
                .create_order_item(&mut tx, record.uuid, position, product, *quantity)
                .await?;

            record.items.push(item);
        }

        tx.commit().await?;

        let span = Span::current();

        span.record("order_uuid", tracing::field::display(record.uuid));
        span.record("total", record.total);

        info!(order_uuid = %record.uuid, total = record.total, "created order");

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.owned_order(user, order).await
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn list_orders(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let orders = self.orders.list_orders(&mut tx, user, page).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.initiate_payment",
        skip(self, payer_identity),
        fields(
            user_uuid = %user,
            order_uuid = %order,
            trade_number = tracing::field::Empty
        ),
        err
    )]
    async fn initiate_payment(
        &self,
        user: UserUuid,
        payer_identity: String,
        order: OrderUuid,
    ) -> Result<ClientPaymentParams, OrdersServiceError> {
        if payer_identity.trim().is_empty() {
            return Err(OrdersServiceError::MissingPayerIdentity);
        }

        let record = self.owned_order(user, order).await?;

        if record.status != OrderStatus::Unpaid {
            return Err(OrdersServiceError::InvalidState(record.status));
        }

        let trade_number = trade_number_for(record.uuid, Timestamp::now());

        Span::current().record("trade_number", tracing::field::display(&trade_number));

        let request = PrepayRequest {
            description: record
                .description()
                .unwrap_or(DEFAULT_PAYMENT_DESCRIPTION)
                .to_string(),
            amount: record.total,
            trade_number,
            payer_identity,
        };

        let params = self.gateway.create_prepay(request).await?;

        info!(order_uuid = %record.uuid, "initiated payment");

        Ok(params)
    }

    #[tracing::instrument(
        name = "orders.service.cancel_order",
        skip(self),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .orders
            .find_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        if record.user_uuid != user {
            return Err(OrdersServiceError::Forbidden);
        }

        if !record.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(OrdersServiceError::InvalidState(record.status));
        }

        let rows_affected = self
            .orders
            .transition_status(&mut tx, order, OrderStatus::Unpaid, OrderStatus::Cancelled)
            .await?;

        let current = self
            .orders
            .find_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::InvalidState(current.status));
        }

        tx.commit().await?;

        info!(order_uuid = %order, "cancelled order");

        Ok(current)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Place an order, snapshotting each product's name, kind and price.
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve one of the user's orders.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// The user's orders, newest first.
    async fn list_orders(
        &self,
        user: UserUuid,
        page: Page,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Open a gateway payment for an unpaid order.
    async fn initiate_payment(
        &self,
        user: UserUuid,
        payer_identity: String,
        order: OrderUuid,
    ) -> Result<ClientPaymentParams, OrdersServiceError>;

    /// Cancel an unpaid order.
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

fn order_total(lines: impl IntoIterator<Item = (u64, u32)>) -> Option<u64> {
    lines.into_iter().try_fold(0_u64, |total, (price, quantity)| {
        total.checked_add(price.checked_mul(u64::from(quantity))?)
    })
}
