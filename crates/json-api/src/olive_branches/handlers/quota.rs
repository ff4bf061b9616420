//! Quota Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use trellis_app::domain::quotas::records::QuotaSummary;

use crate::{extensions::*, olive_branches::errors::into_status_error, state::State};

/// Quota Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuotaResponse {
    /// Free olive branches granted each day
    pub free_allowance: u32,

    /// Free olive branches left today
    pub free_remaining: u32,

    /// Purchased olive branches left
    pub paid_balance: u64,
}

impl From<QuotaSummary> for QuotaResponse {
    fn from(summary: QuotaSummary) -> Self {
        Self {
            free_allowance: summary.free_allowance,
            free_remaining: summary.free_remaining,
            paid_balance: summary.paid_balance,
        }
    }
}

/// Quota Handler
///
/// Returns how many olive branches the caller can still send today.
#[endpoint(tags("olive-branches"), summary = "Get Quota")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<QuotaResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let summary = state
        .app
        .olive_branches
        .get_quota(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use trellis_app::domain::{
        olive_branches::MockOliveBranchesService, quotas::DAILY_FREE_ALLOWANCE,
    };

    use crate::test_helpers::{TEST_USER_UUID, olive_branches_service};

    use super::*;

    #[tokio::test]
    async fn test_quota_returns_summary() -> TestResult {
        let mut olive_branches = MockOliveBranchesService::new();

        olive_branches
            .expect_get_quota()
            .once()
            .withf(|user| *user == TEST_USER_UUID)
            .return_once(|_| {
                Ok(QuotaSummary {
                    free_allowance: DAILY_FREE_ALLOWANCE,
                    free_remaining: 2,
                    paid_balance: 7,
                })
            });

        let response: QuotaResponse = TestClient::get("http://example.com/quota")
            .send(&olive_branches_service(
                olive_branches,
                Router::with_path("quota").get(handler),
            ))
            .await
            .take_json()
            .await?;

        assert_eq!(response.free_allowance, DAILY_FREE_ALLOWANCE);
        assert_eq!(response.free_remaining, 2);
        assert_eq!(response.paid_balance, 7);

        Ok(())
    }
}
