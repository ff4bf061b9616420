//! Payment Records

use jiff::Timestamp;

use crate::{
    domain::{
        orders::records::{OrderItemUuid, OrderUuid},
        products::records::ProductUuid,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Service Entitlement UUID
pub type ServiceEntitlementUuid = TypedUuid<ServiceEntitlementRecord>;

/// A service granted by a paid order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntitlementRecord {
    pub uuid: ServiceEntitlementUuid,
    pub order_uuid: OrderUuid,
    pub order_item_uuid: OrderItemUuid,
    pub user_uuid: UserUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub created_at: Timestamp,
}

/// How a notification was disposed of. Every outcome is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The order was settled and its benefits granted.
    Applied,

    /// The order had already been settled, possibly by a concurrent delivery.
    AlreadyPaid,

    /// The order was cancelled or refunded before the payment arrived.
    OrderNotPayable,

    /// The trade number refers to an order that does not exist.
    UnknownOrder,

    /// The trade number was not issued by us.
    ForeignTradeNumber,

    /// The gateway reported a failed or closed trade.
    TradeNotSuccessful,
}

impl NotificationOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyPaid => "already_paid",
            Self::OrderNotPayable => "order_not_payable",
            Self::UnknownOrder => "unknown_order",
            Self::ForeignTradeNumber => "foreign_trade_number",
            Self::TradeNotSuccessful => "trade_not_successful",
        }
    }
}
