//! Email Promotion Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    email_promotions::{errors::into_status_error, get::EmailPromotionResponse},
    extensions::*,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct EmailPromotionsResponse {
    /// The caller's promotions, newest first
    pub email_promotions: Vec<EmailPromotionResponse>,

    pub page: u32,
    pub size: u32,
}

/// Email Promotion Index Handler
#[endpoint(tags("email-promotions"), summary = "List Email Promotions")]
pub(crate) async fn handler(
    page: QueryParam<u32, false>,
    size: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<EmailPromotionsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let page = page.into_page(size);

    let promotions = state
        .app
        .email_promotions
        .list_by_creator(user, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(EmailPromotionsResponse {
        email_promotions: promotions.into_iter().map(Into::into).collect(),
        page: page.page(),
        size: page.size(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use trellis_app::{
        domain::email_promotions::{
            MockEmailPromotionsService,
            records::{EmailPromotionUuid, PromotionStatus},
        },
        pagination::Page,
    };

    use crate::{
        email_promotions::handlers::tests::make_promotion,
        test_helpers::{TEST_USER_UUID, email_promotions_service},
    };

    use super::*;

    #[tokio::test]
    async fn test_index_lists_callers_promotions() -> TestResult {
        let uuid = EmailPromotionUuid::new();
        let promotion = make_promotion(uuid, PromotionStatus::Sending);

        let mut email_promotions = MockEmailPromotionsService::new();

        email_promotions
            .expect_list_by_creator()
            .once()
            .withf(|user, page| *user == TEST_USER_UUID && *page == Page::new(None, Some(5)))
            .return_once(move |_, _| Ok(vec![promotion]));

        let response: EmailPromotionsResponse =
            TestClient::get("http://example.com/email-promotions?size=5")
                .send(&email_promotions_service(
                    email_promotions,
                    Router::with_path("email-promotions").get(handler),
                ))
                .await
                .take_json()
                .await?;

        assert_eq!(response.email_promotions.len(), 1);
        assert_eq!(response.email_promotions[0].uuid, uuid.into_uuid());
        assert_eq!(response.email_promotions[0].status, "sending");
        assert_eq!(response.size, 5);

        Ok(())
    }
}
