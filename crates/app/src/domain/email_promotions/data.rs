//! Email Promotion Data

use crate::domain::{
    email_promotions::records::EmailPromotionUuid, orders::records::OrderUuid,
    projects::records::ProjectUuid,
};

/// Request to start a promotion paid for by `order_uuid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEmailPromotion {
    pub order_uuid: OrderUuid,
    pub project_uuid: ProjectUuid,
}

/// A promotion that has been recorded and queued for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggeredPromotion {
    pub uuid: EmailPromotionUuid,
    pub max_recipients: u32,
}
