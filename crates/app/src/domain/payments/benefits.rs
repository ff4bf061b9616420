//! Benefit dispatch.
//!
//! Maps each settled order line to its effect. Runs inside the settling
//! transaction so a failure rolls the payment back with it.

use sqlx::{Postgres, Transaction};
use tracing::{debug, warn};

use crate::domain::{
    orders::records::OrderRecord,
    payments::repository::PgEntitlementsRepository,
    products::records::ProductKind,
    quotas::repository::PgQuotaLedgerRepository,
};

/// What dispatching an order granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub credits_granted: u64,
    pub entitlements_granted: u32,
    pub lines_skipped: u32,
}

#[derive(Debug, Clone, Default)]
pub struct BenefitDispatcher {
    quotas: PgQuotaLedgerRepository,
    entitlements: PgEntitlementsRepository,
}

impl BenefitDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            quotas: PgQuotaLedgerRepository::new(),
            entitlements: PgEntitlementsRepository::new(),
        }
    }

    /// Grant the benefits of every line on `order`.
    ///
    /// # Errors
    ///
    /// Returns the first storage error. Lines of unrecognised kinds are logged
    /// and skipped rather than failing the order.
    pub async fn dispatch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &OrderRecord,
    ) -> Result<DispatchSummary, sqlx::Error> {
        let mut summary = DispatchSummary::default();

        for item in &order.items {
            match &item.product_kind {
                ProductKind::CreditTopup => {
                    let balance = self
                        .quotas
                        .add_paid_balance(tx, order.user_uuid, u64::from(item.quantity))
                        .await?;

                    summary.credits_granted += u64::from(item.quantity);

                    debug!(
                        order_uuid = %order.uuid,
                        user_uuid = %order.user_uuid,
                        quantity = item.quantity,
                        balance,
                        "granted paid invitation credits"
                    );
                }
                ProductKind::ServiceEntitlement => {
                    self.entitlements
                        .create_entitlement(tx, order.user_uuid, item)
                        .await?;

                    summary.entitlements_granted += item.quantity;
                }
                ProductKind::Unrecognised(kind) => {
                    summary.lines_skipped += 1;

                    warn!(
                        order_uuid = %order.uuid,
                        order_item_uuid = %item.uuid,
                        product_kind = %kind,
                        "no benefit defined for product kind; skipping line"
                    );
                }
            }
        }

        Ok(summary)
    }
}
