//! App Router

use std::sync::Arc;

use salvo::{
    Router,
    affix_state::inject,
    catch_panic::CatchPanic,
    oapi::{OpenApi, swagger_ui::SwaggerUi},
    trailing_slash::remove_slash,
};

use crate::{
    email_promotions, healthcheck, identity, observability, olive_branches, orders, payments,
    state::State, unsubscribe,
};

const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Routes served on behalf of an authenticated user.
fn user_router() -> Router {
    Router::new()
        .hoop(identity::handler)
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .post(orders::create::handler)
                .push(
                    Router::with_path("{order}")
                        .get(orders::get::handler)
                        .push(Router::with_path("payment").post(orders::pay::handler))
                        .push(Router::with_path("cancel").post(orders::cancel::handler)),
                ),
        )
        .push(Router::with_path("quota").get(olive_branches::quota::handler))
        .push(
            Router::with_path("olive-branches")
                .post(olive_branches::send::handler)
                .push(Router::with_path("received").get(olive_branches::received::handler))
                .push(Router::with_path("sent").get(olive_branches::sent::handler))
                .push(
                    Router::with_path("{branch}/handle").post(olive_branches::handle::handler),
                ),
        )
        .push(
            Router::with_path("email-promotions")
                .get(email_promotions::index::handler)
                .post(email_promotions::trigger::handler)
                .push(Router::with_path("{promotion}").get(email_promotions::get::handler)),
        )
}

/// Routes the payment gateway and email recipients reach without a user
/// identity. Each authenticates its request by signature instead.
fn public_router() -> Router {
    Router::new()
        .push(Router::with_path("payments/notify").post(payments::notify::handler))
        .push(Router::with_path("email/unsubscribe").get(unsubscribe::handler))
}

pub(crate) fn app_router(state: Arc<State>) -> Router {
    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability::request_logging)
        .hoop(inject(state))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(public_router())
        .push(user_router());

    let doc = OpenApi::new("Trellis API", env!("CARGO_PKG_VERSION")).merge_router(&router);

    router
        .push(doc.into_router(OPENAPI_PATH))
        .push(SwaggerUi::new(OPENAPI_PATH).into_router("docs"))
}
