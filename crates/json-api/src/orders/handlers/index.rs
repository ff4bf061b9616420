//! Order Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, get::OrderResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    /// The caller's orders, newest first
    pub orders: Vec<OrderResponse>,

    pub page: u32,
    pub size: u32,
}

/// Order Index Handler
///
/// Returns a page of the caller's orders.
#[endpoint(tags("orders"), summary = "List Orders")]
pub(crate) async fn handler(
    page: QueryParam<u32, false>,
    size: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<OrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let page = page.into_page(size);

    let orders = state
        .app
        .orders
        .list_orders(user, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(Into::into).collect(),
        page: page.page(),
        size: page.size(),
    }))
}
