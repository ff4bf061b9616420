//! Order Handlers

pub(crate) mod cancel;
pub(crate) mod create;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod pay;

#[cfg(test)]
pub(crate) mod tests {
    use jiff::Timestamp;

    use trellis_app::domain::{
        orders::records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
        products::records::{ProductKind, ProductUuid},
    };

    use crate::test_helpers::TEST_USER_UUID;

    pub(crate) fn make_order(uuid: OrderUuid, status: OrderStatus) -> OrderRecord {
        OrderRecord {
            uuid,
            user_uuid: TEST_USER_UUID,
            total: 1_500,
            status,
            transaction_id: None,
            paid_at: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            items: vec![OrderItemRecord {
                uuid: OrderItemUuid::new(),
                order_uuid: uuid,
                product_uuid: ProductUuid::new(),
                product_name: "Five invitations".to_string(),
                product_kind: ProductKind::CreditTopup,
                price: 300,
                quantity: 5,
            }],
        }
    }
}
