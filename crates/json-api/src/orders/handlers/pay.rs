//! Pay Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trellis_app::domain::payments::gateway::ClientPaymentParams;

use crate::{extensions::*, orders::errors::into_status_error, state::State};

/// Parameters the client SDK presents the payment sheet with.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentParamsResponse {
    pub time_stamp: String,
    pub nonce_str: String,
    pub package: String,
    pub sign_type: String,
    pub pay_sign: String,
}

impl From<ClientPaymentParams> for PaymentParamsResponse {
    fn from(params: ClientPaymentParams) -> Self {
        Self {
            time_stamp: params.time_stamp,
            nonce_str: params.nonce_str,
            package: params.package,
            sign_type: params.sign_type,
            pay_sign: params.pay_sign,
        }
    }
}

/// Pay Order Handler
///
/// Opens a gateway payment for an unpaid order on behalf of the caller's
/// payment identity.
#[endpoint(
    tags("orders"),
    summary = "Pay Order",
    responses(
        (status_code = StatusCode::OK, description = "Payment opened"),
        (status_code = StatusCode::BAD_REQUEST, description = "Order cannot be paid"),
        (status_code = StatusCode::FORBIDDEN, description = "Order belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Gateway failure"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<PaymentParamsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let payer_identity = depot
        .caller()
        .and_then(|caller| caller.payer_identity.clone())
        .unwrap_or_default();

    let params = state
        .app
        .orders
        .initiate_payment(user, payer_identity, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(params.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;

    use trellis_app::domain::{
        orders::{
            MockOrdersService, OrdersServiceError,
            records::{OrderStatus, OrderUuid},
        },
        payments::gateway::GatewayError,
    };

    use crate::test_helpers::{TEST_PAYER_IDENTITY, TEST_USER_UUID, orders_service};

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(
            orders,
            Router::with_path("orders/{order}/payment").post(handler),
        )
    }

    fn params() -> ClientPaymentParams {
        ClientPaymentParams {
            time_stamp: "1700000000".to_string(),
            nonce_str: "nonce".to_string(),
            package: "prepay_id=wx1".to_string(),
            sign_type: "HMAC-SHA256".to_string(),
            pay_sign: "abcdef".to_string(),
        }
    }

    #[tokio::test]
    async fn test_pay_returns_client_params_verbatim() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_initiate_payment()
            .once()
            .withf(move |user, payer, order| {
                *user == TEST_USER_UUID && payer == TEST_PAYER_IDENTITY && *order == uuid
            })
            .return_once(|_, _, _| Ok(params()));

        let mut res = TestClient::post(format!("http://example.com/orders/{uuid}/payment"))
            .send(&make_service(orders))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["package"], "prepay_id=wx1");
        assert_eq!(body["paySign"], "abcdef");
        assert_eq!(body["timeStamp"], "1700000000");

        Ok(())
    }

    #[tokio::test]
    async fn test_pay_settled_order_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_initiate_payment()
            .once()
            .return_once(|_, _, _| Err(OrdersServiceError::InvalidState(OrderStatus::Paid)));

        let res = TestClient::post(format!(
            "http://example.com/orders/{}/payment",
            Uuid::now_v7()
        ))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_pay_gateway_failure_returns_500() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_initiate_payment()
            .once()
            .return_once(|_, _, _| {
                Err(OrdersServiceError::Gateway(GatewayError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                }))
            });

        let res = TestClient::post(format!(
            "http://example.com/orders/{}/payment",
            Uuid::now_v7()
        ))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
