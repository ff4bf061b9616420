//! Cancel Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, get::OrderResponse},
    state::State,
};

/// Cancel Order Handler
///
/// Only unpaid orders can be cancelled.
#[endpoint(
    tags("orders"),
    summary = "Cancel Order",
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::BAD_REQUEST, description = "Order is no longer unpaid"),
        (status_code = StatusCode::FORBIDDEN, description = "Order belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let order = state
        .app
        .orders
        .cancel_order(user, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use trellis_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        records::{OrderStatus, OrderUuid},
    };

    use crate::{
        orders::handlers::tests::make_order,
        test_helpers::{TEST_USER_UUID, orders_service},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(
            orders,
            Router::with_path("orders/{order}/cancel").post(handler),
        )
    }

    #[tokio::test]
    async fn test_cancel_returns_cancelled_order() -> TestResult {
        let uuid = OrderUuid::new();
        let order = make_order(uuid, OrderStatus::Cancelled);

        let mut orders = MockOrdersService::new();

        orders
            .expect_cancel_order()
            .once()
            .withf(move |user, o| *user == TEST_USER_UUID && *o == uuid)
            .return_once(move |_, _| Ok(order));

        let mut res = TestClient::post(format!("http://example.com/orders/{uuid}/cancel"))
            .send(&make_service(orders))
            .await;

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status, "cancelled");

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_paid_order_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_cancel_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::InvalidState(OrderStatus::Paid)));

        let res = TestClient::post(format!(
            "http://example.com/orders/{}/cancel",
            Uuid::now_v7()
        ))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
