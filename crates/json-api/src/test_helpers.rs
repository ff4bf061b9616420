//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use trellis_app::{
    context::AppContext,
    domain::{
        email_promotions::MockEmailPromotionsService, olive_branches::MockOliveBranchesService,
        orders::MockOrdersService, payments::MockPaymentsService,
        unsubscribe::MockUnsubscribeService, users::records::UserUuid,
    },
};

use crate::{extensions::*, identity::Caller, state::State};

pub(crate) const TEST_USER_UUID: UserUuid =
    UserUuid::from_uuid(Uuid::from_u128(0x0192_f3a4_7b1c_7d2e_8f90_a1b2_c3d4_e5f6));

pub(crate) const TEST_PAYER_IDENTITY: &str = "openid-test";

/// Service mocks for a handler test. Unconfigured mocks fail on any call.
#[derive(Default)]
pub(crate) struct Mocks {
    pub(crate) orders: MockOrdersService,
    pub(crate) payments: MockPaymentsService,
    pub(crate) olive_branches: MockOliveBranchesService,
    pub(crate) email_promotions: MockEmailPromotionsService,
    pub(crate) unsubscribe: MockUnsubscribeService,
}

impl Mocks {
    /// Mocked services with no database or campaign runner behind them.
    pub(crate) fn into_app_context(self) -> AppContext {
        AppContext {
            orders: Arc::new(self.orders),
            payments: Arc::new(self.payments),
            olive_branches: Arc::new(self.olive_branches),
            email_promotions: Arc::new(self.email_promotions),
            unsubscribe: Arc::new(self.unsubscribe),
            campaigns: None,
            db: None,
        }
    }

    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(self.into_app_context())
    }
}

#[salvo::handler]
pub(crate) async fn inject_caller(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_caller(Caller {
        user_uuid: TEST_USER_UUID,
        payer_identity: Some(TEST_PAYER_IDENTITY.to_string()),
    });

    ctrl.call_next(req, depot, res).await;
}

/// A service whose requests are made on behalf of [`TEST_USER_UUID`].
pub(crate) fn authenticated_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_caller)
            .push(route),
    )
}

/// A service for routes reachable without a caller identity.
pub(crate) fn anonymous_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .push(route),
    )
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    authenticated_service(
        Mocks {
            orders,
            ..Mocks::default()
        },
        route,
    )
}

pub(crate) fn olive_branches_service(
    olive_branches: MockOliveBranchesService,
    route: Router,
) -> Service {
    authenticated_service(
        Mocks {
            olive_branches,
            ..Mocks::default()
        },
        route,
    )
}

pub(crate) fn email_promotions_service(
    email_promotions: MockEmailPromotionsService,
    route: Router,
) -> Service {
    authenticated_service(
        Mocks {
            email_promotions,
            ..Mocks::default()
        },
        route,
    )
}
