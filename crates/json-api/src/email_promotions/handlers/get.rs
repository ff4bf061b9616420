//! Get Email Promotion Handler

use std::{string::ToString, sync::Arc};

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trellis_app::domain::email_promotions::records::EmailPromotionRecord;

use crate::{email_promotions::errors::into_status_error, extensions::*, state::State};

/// Email Promotion Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct EmailPromotionResponse {
    pub uuid: Uuid,

    /// The order that paid for the promotion
    pub order_uuid: Uuid,

    /// The advertised project
    pub project_uuid: Uuid,

    pub max_recipients: u32,

    /// Emails accepted by the mail relay so far
    pub total_sent: u32,

    /// One of `pending`, `sending`, `completed` or `failed`
    pub status: String,

    /// Why the campaign failed
    pub error_message: Option<String>,

    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<EmailPromotionRecord> for EmailPromotionResponse {
    fn from(promotion: EmailPromotionRecord) -> Self {
        Self {
            uuid: promotion.uuid.into_uuid(),
            order_uuid: promotion.order_uuid.into_uuid(),
            project_uuid: promotion.project_uuid.into_uuid(),
            max_recipients: promotion.max_recipients,
            total_sent: promotion.total_sent,
            status: promotion.status.to_string(),
            error_message: promotion.error_message,
            started_at: promotion.started_at.as_ref().map(ToString::to_string),
            completed_at: promotion.completed_at.as_ref().map(ToString::to_string),
            created_at: promotion.created_at.to_string(),
            updated_at: promotion.updated_at.to_string(),
        }
    }
}

/// Get Email Promotion Handler
///
/// Returns the delivery status of one of the caller's promotions.
#[endpoint(
    tags("email-promotions"),
    summary = "Get Email Promotion",
    responses(
        (status_code = StatusCode::OK, description = "Promotion found"),
        (status_code = StatusCode::FORBIDDEN, description = "Promotion belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Promotion not found"),
    ),
)]
pub(crate) async fn handler(
    promotion: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<EmailPromotionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let promotion = state
        .app
        .email_promotions
        .get_status(user, promotion.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(promotion.into()))
}
