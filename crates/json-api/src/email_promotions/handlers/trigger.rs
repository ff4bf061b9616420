//! Trigger Email Promotion Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trellis_app::domain::email_promotions::{
    data::{NewEmailPromotion, TriggeredPromotion},
    records::PromotionStatus,
};

use crate::{email_promotions::errors::into_status_error, extensions::*, state::State};

/// Trigger Email Promotion Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TriggerEmailPromotionRequest {
    /// A paid order that includes an email promotion
    pub order_uuid: Uuid,

    /// The caller's project to advertise
    pub project_uuid: Uuid,
}

impl From<TriggerEmailPromotionRequest> for NewEmailPromotion {
    fn from(request: TriggerEmailPromotionRequest) -> Self {
        NewEmailPromotion {
            order_uuid: request.order_uuid.into(),
            project_uuid: request.project_uuid.into(),
        }
    }
}

/// Email Promotion Triggered Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct EmailPromotionTriggeredResponse {
    pub uuid: Uuid,

    /// Upper bound on how many users will be emailed
    pub max_recipients: u32,

    pub status: String,
}

impl From<TriggeredPromotion> for EmailPromotionTriggeredResponse {
    fn from(promotion: TriggeredPromotion) -> Self {
        Self {
            uuid: promotion.uuid.into_uuid(),
            max_recipients: promotion.max_recipients,
            status: PromotionStatus::Pending.to_string(),
        }
    }
}

/// Trigger Email Promotion Handler
///
/// Records the promotion and returns at once; emails are sent in the
/// background.
#[endpoint(
    tags("email-promotions"),
    summary = "Trigger Email Promotion",
    responses(
        (status_code = StatusCode::ACCEPTED, description = "Promotion queued"),
        (status_code = StatusCode::BAD_REQUEST, description = "Order not paid or not eligible"),
        (status_code = StatusCode::FORBIDDEN, description = "Order or project belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Order or project not found"),
        (status_code = StatusCode::CONFLICT, description = "Already triggered for this order"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<TriggerEmailPromotionRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<EmailPromotionTriggeredResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let promotion = state
        .app
        .email_promotions
        .trigger_promotion(user, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(
        LOCATION,
        format!("/email-promotions/{}", promotion.uuid),
        true,
    )
    .or_500("failed to set location header")?
    .status_code(StatusCode::ACCEPTED);

    Ok(Json(promotion.into()))
}
