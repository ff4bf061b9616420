//! Payments Service

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, error, info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{
            records::{OrderStatus, OrderUuid},
            repository::PgOrdersRepository,
        },
        payments::{
            PaymentsServiceError,
            benefits::BenefitDispatcher,
            gateway::{GatewayTransaction, NotificationRequest, PaymentGateway},
            records::NotificationOutcome,
            trade_number::parse_trade_number,
        },
    },
};

#[derive(Clone)]
pub struct PgPaymentsService {
    db: Db,
    orders: PgOrdersRepository,
    benefits: BenefitDispatcher,
    gateway: Arc<dyn PaymentGateway>,
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            benefits: BenefitDispatcher::new(),
            gateway,
        }
    }

    async fn apply(
        &self,
        transaction: &GatewayTransaction,
    ) -> Result<NotificationOutcome, PaymentsServiceError> {
        let Some(order) = parse_trade_number(&transaction.out_trade_no) else {
            warn!(
                trade_number = %transaction.out_trade_no,
                "notification for unrecognised trade number"
            );

            return Ok(NotificationOutcome::ForeignTradeNumber);
        };

        Span::current().record("order_uuid", tracing::field::display(order));

        if !transaction.is_success() {
            if let Err(source) = self.cancel_unpaid(order).await {
                error!(order_uuid = %order, "failed to cancel order after unsuccessful trade: {source}");
            }

            info!(
                order_uuid = %order,
                trade_state = %transaction.trade_state,
                "trade not successful"
            );

            return Ok(NotificationOutcome::TradeNotSuccessful);
        }

        let mut tx = self.db.begin().await?;

        let Some(record) = self.orders.find_order(&mut tx, order).await? else {
            warn!(order_uuid = %order, "notification for unknown order");

            return Ok(NotificationOutcome::UnknownOrder);
        };

        if record.status == OrderStatus::Paid {
            return Ok(NotificationOutcome::AlreadyPaid);
        }

        if !record.status.can_transition_to(OrderStatus::Paid) {
            warn!(
                order_uuid = %order,
                status = %record.status,
                "payment received for an order that can no longer be paid"
            );

            return Ok(NotificationOutcome::OrderNotPayable);
        }

        let paid_at = transaction
            .success_time
            .as_deref()
            .and_then(|value| value.parse::<Timestamp>().ok())
            .unwrap_or_else(Timestamp::now);

        let rows_affected = self
            .orders
            .mark_paid(&mut tx, order, transaction.transaction_id.as_deref(), paid_at)
            .await?;

        // Another delivery settled it first.
        if rows_affected == 0 {
            tx.rollback().await?;

            info!(order_uuid = %order, "order not settled; status changed concurrently");

            return Ok(NotificationOutcome::AlreadyPaid);
        }

        let summary = self.benefits.dispatch(&mut tx, &record).await?;

        tx.commit().await?;

        info!(
            order_uuid = %order,
            credits_granted = summary.credits_granted,
            entitlements_granted = summary.entitlements_granted,
            lines_skipped = summary.lines_skipped,
            "order settled"
        );

        Ok(NotificationOutcome::Applied)
    }

    async fn cancel_unpaid(&self, order: OrderUuid) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        self.orders
            .transition_status(&mut tx, order, OrderStatus::Unpaid, OrderStatus::Cancelled)
            .await?;

        tx.commit().await
    }
}

impl Debug for PgPaymentsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgPaymentsService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.service.handle_notification",
        skip(self, notification),
        fields(
            trade_number = tracing::field::Empty,
            order_uuid = tracing::field::Empty,
            outcome = tracing::field::Empty
        ),
        err
    )]
    async fn handle_notification(
        &self,
        notification: NotificationRequest,
    ) -> Result<NotificationOutcome, PaymentsServiceError> {
        let transaction = self
            .gateway
            .verify_notification(&notification)
            .await
            .map_err(PaymentsServiceError::InvalidSignature)?;

        Span::current().record(
            "trade_number",
            tracing::field::display(&transaction.out_trade_no),
        );

        let outcome = self.apply(&transaction).await?;

        Span::current().record("outcome", outcome.as_str());

        Ok(outcome)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Verify and apply a gateway payment notification.
    ///
    /// Every `Ok` outcome should be acknowledged to the gateway; errors ask it
    /// to redeliver.
    async fn handle_notification(
        &self,
        notification: NotificationRequest,
    ) -> Result<NotificationOutcome, PaymentsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        domain::{
            orders::{
                OrdersService,
                data::{NewOrder, NewOrderItem},
                records::OrderRecord,
            },
            payments::{
                gateway::{GatewayError, MockPaymentGateway},
                trade_number::trade_number_for,
            },
            products::records::{ProductKind, ProductUuid},
            users::records::UserUuid,
        },
        test::{
            TestContext,
            helpers::{
                count_entitlements, create_product, create_user, mark_order_paid, paid_balance,
            },
        },
    };

    use super::*;

    fn notification() -> NotificationRequest {
        NotificationRequest {
            signature: "sig".to_string(),
            timestamp: "1".to_string(),
            nonce: "n".to_string(),
            body: "{}".to_string(),
        }
    }

    fn success(order: OrderUuid) -> GatewayTransaction {
        GatewayTransaction {
            out_trade_no: trade_number_for(order, Timestamp::now()),
            trade_state: "SUCCESS".to_string(),
            transaction_id: Some("4200001".to_string()),
            success_time: Some("2026-10-19T10:00:00+08:00".to_string()),
        }
    }

    fn gateway_returning(transaction: GatewayTransaction) -> MockPaymentGateway {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_verify_notification()
            .returning(move |_| Ok(transaction.clone()));

        gateway.expect_create_prepay().never();

        gateway
    }

    async fn place_order(
        ctx: &TestContext,
        user: UserUuid,
        lines: &[(ProductUuid, u32)],
    ) -> TestResult<OrderRecord> {
        let order = ctx
            .orders
            .create_order(
                user,
                NewOrder {
                    items: lines
                        .iter()
                        .map(|(product_uuid, quantity)| NewOrderItem {
                            product_uuid: *product_uuid,
                            quantity: *quantity,
                        })
                        .collect(),
                },
            )
            .await?;

        Ok(order)
    }

    #[tokio::test]
    async fn invalid_signature_is_rejected_without_side_effects() -> TestResult {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_verify_notification()
            .once()
            .return_once(|_| Err(GatewayError::InvalidSignature));

        let ctx = TestContext::with_gateway(gateway).await;

        let result = ctx.payments.handle_notification(notification()).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::InvalidSignature(_))),
            "expected InvalidSignature, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn credit_topup_is_applied_exactly_once() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let credits = create_product(&ctx, ProductKind::CreditTopup, "Credits", 100).await?;
        let order = place_order(&ctx, user, &[(credits, 3)]).await?;

        let payments = ctx.payments_with(gateway_returning(success(order.uuid)));

        let first = payments.handle_notification(notification()).await?;
        let second = payments.handle_notification(notification()).await?;

        assert_eq!(first, NotificationOutcome::Applied);
        assert_eq!(second, NotificationOutcome::AlreadyPaid);
        assert_eq!(paid_balance(&ctx, user).await?, 3);

        let settled = ctx.orders.get_order(user, order.uuid).await?;
        let expected_paid_at: Timestamp = "2026-10-19T02:00:00Z".parse()?;

        assert_eq!(settled.status, OrderStatus::Paid);
        assert_eq!(settled.transaction_id.as_deref(), Some("4200001"));
        assert_eq!(settled.paid_at, Some(expected_paid_at));

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_deliveries_settle_once() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let credits = create_product(&ctx, ProductKind::CreditTopup, "Credits", 100).await?;
        let order = place_order(&ctx, user, &[(credits, 2)]).await?;

        let payments = ctx.payments_with(gateway_returning(success(order.uuid)));

        let (a, b) = tokio::join!(
            payments.handle_notification(notification()),
            payments.handle_notification(notification()),
        );

        let outcomes = [a?, b?];
        let applied = outcomes
            .iter()
            .filter(|outcome| **outcome == NotificationOutcome::Applied)
            .count();

        assert_eq!(applied, 1, "exactly one delivery should apply, got {outcomes:?}");
        assert_eq!(paid_balance(&ctx, user).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn service_entitlement_lines_are_recorded() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let emails = create_product(&ctx, ProductKind::ServiceEntitlement, "Emails", 50).await?;
        let order = place_order(&ctx, user, &[(emails, 20)]).await?;

        let payments = ctx.payments_with(gateway_returning(success(order.uuid)));

        let outcome = payments.handle_notification(notification()).await?;

        assert_eq!(outcome, NotificationOutcome::Applied);
        assert_eq!(count_entitlements(&ctx, order.uuid).await?, 1);
        assert_eq!(paid_balance(&ctx, user).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn unrecognised_product_kind_is_skipped() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let credits = create_product(&ctx, ProductKind::CreditTopup, "Credits", 100).await?;
        let badge = create_product(
            &ctx,
            ProductKind::Unrecognised("profile_badge".to_string()),
            "Badge",
            100,
        )
        .await?;
        let order = place_order(&ctx, user, &[(badge, 1), (credits, 1)]).await?;

        let payments = ctx.payments_with(gateway_returning(success(order.uuid)));

        let outcome = payments.handle_notification(notification()).await?;

        assert_eq!(outcome, NotificationOutcome::Applied);
        assert_eq!(paid_balance(&ctx, user).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn dispatch_failure_rolls_back_settlement() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let credits = create_product(&ctx, ProductKind::CreditTopup, "Credits", 100).await?;
        let emails = create_product(&ctx, ProductKind::ServiceEntitlement, "Emails", 50).await?;
        let order = place_order(&ctx, user, &[(credits, 4), (emails, 5)]).await?;

        let entitled_item = order.items.get(1).ok_or("missing item")?;

        // A pre-existing entitlement for the line makes the insert collide.
        sqlx::query(
            "INSERT INTO service_entitlements \
             (uuid, order_uuid, order_item_uuid, user_uuid, product_uuid, quantity) \
             VALUES ($1, $2, $3, $4, $5, 1)",
        )
        .bind(uuid::Uuid::now_v7())
        .bind(order.uuid.into_uuid())
        .bind(entitled_item.uuid.into_uuid())
        .bind(user.into_uuid())
        .bind(emails.into_uuid())
        .execute(ctx.db.pool())
        .await?;

        let payments = ctx.payments_with(gateway_returning(success(order.uuid)));

        let result = payments.handle_notification(notification()).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::Sql(_))),
            "expected Sql, got {result:?}"
        );

        let unchanged = ctx.orders.get_order(user, order.uuid).await?;

        assert_eq!(unchanged.status, OrderStatus::Unpaid);
        assert_eq!(paid_balance(&ctx, user).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn foreign_trade_number_is_acknowledged() -> TestResult {
        let ctx = TestContext::new().await;

        let payments = ctx.payments_with(gateway_returning(GatewayTransaction {
            out_trade_no: "KZ1700000000_12".to_string(),
            ..success(OrderUuid::new())
        }));

        let outcome = payments.handle_notification(notification()).await?;

        assert_eq!(outcome, NotificationOutcome::ForeignTradeNumber);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_is_acknowledged() -> TestResult {
        let ctx = TestContext::new().await;

        let payments = ctx.payments_with(gateway_returning(success(OrderUuid::new())));

        let outcome = payments.handle_notification(notification()).await?;

        assert_eq!(outcome, NotificationOutcome::UnknownOrder);

        Ok(())
    }

    #[tokio::test]
    async fn unsuccessful_trade_cancels_unpaid_order() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let credits = create_product(&ctx, ProductKind::CreditTopup, "Credits", 100).await?;
        let order = place_order(&ctx, user, &[(credits, 1)]).await?;

        let payments = ctx.payments_with(gateway_returning(GatewayTransaction {
            trade_state: "CLOSED".to_string(),
            ..success(order.uuid)
        }));

        let outcome = payments.handle_notification(notification()).await?;

        assert_eq!(outcome, NotificationOutcome::TradeNotSuccessful);

        let cancelled = ctx.orders.get_order(user, order.uuid).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(paid_balance(&ctx, user).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn unsuccessful_trade_leaves_paid_order_alone() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let credits = create_product(&ctx, ProductKind::CreditTopup, "Credits", 100).await?;
        let order = place_order(&ctx, user, &[(credits, 1)]).await?;

        mark_order_paid(&ctx, order.uuid).await?;

        let payments = ctx.payments_with(gateway_returning(GatewayTransaction {
            trade_state: "REFUND".to_string(),
            ..success(order.uuid)
        }));

        payments.handle_notification(notification()).await?;

        let still_paid = ctx.orders.get_order(user, order.uuid).await?;

        assert_eq!(still_paid.status, OrderStatus::Paid);

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_order_is_not_settled() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "buyer", None).await?;
        let credits = create_product(&ctx, ProductKind::CreditTopup, "Credits", 100).await?;
        let order = place_order(&ctx, user, &[(credits, 1)]).await?;

        ctx.orders.cancel_order(user, order.uuid).await?;

        let payments = ctx.payments_with(gateway_returning(success(order.uuid)));

        let outcome = payments.handle_notification(notification()).await?;

        assert_eq!(outcome, NotificationOutcome::OrderNotPayable);
        assert_eq!(paid_balance(&ctx, user).await?, 0);

        Ok(())
    }
}
