//! Orders Data

use crate::domain::products::records::ProductUuid;

/// New Order Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
}

/// New Order Item Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}
