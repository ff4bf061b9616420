//! Unsubscribe Handler
//!
//! Target of the link in every promotion email. Recipients open it in a
//! browser, so outcomes are rendered as small HTML pages.

use std::sync::Arc;

use salvo::prelude::*;
use tracing::{error, info, warn};

use trellis_app::domain::unsubscribe::UnsubscribeServiceError;

use crate::state::State;

const TOKEN_PARAM: &str = "token";

#[handler]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Ok(state) = depot.obtain::<Arc<State>>() else {
        render_page(res, StatusCode::INTERNAL_SERVER_ERROR, FAILED);

        return;
    };

    let Some(token) = req
        .query::<String>(TOKEN_PARAM)
        .filter(|token| !token.trim().is_empty())
    else {
        render_page(res, StatusCode::BAD_REQUEST, INVALID_LINK);

        return;
    };

    match state.app.unsubscribe.unsubscribe(&token).await {
        Ok(user) => {
            info!(user_uuid = %user, "user unsubscribed from promotion emails");
            render_page(res, StatusCode::OK, UNSUBSCRIBED);
        }
        Err(UnsubscribeServiceError::InvalidToken(source)) => {
            warn!("rejected unsubscribe token: {source}");
            render_page(res, StatusCode::BAD_REQUEST, INVALID_LINK);
        }
        Err(UnsubscribeServiceError::NotFound) => {
            warn!("unsubscribe token names an unknown user");
            render_page(res, StatusCode::NOT_FOUND, INVALID_LINK);
        }
        Err(UnsubscribeServiceError::Sql(source)) => {
            error!("failed to record unsubscribe: {source}");
            render_page(res, StatusCode::INTERNAL_SERVER_ERROR, FAILED);
        }
    }
}

struct Page {
    title: &'static str,
    message: &'static str,
}

const UNSUBSCRIBED: Page = Page {
    title: "Unsubscribed",
    message: "You will no longer receive promotion emails from us.",
};

const INVALID_LINK: Page = Page {
    title: "Link not valid",
    message: "This unsubscribe link is invalid or has expired.",
};

const FAILED: Page = Page {
    title: "Something went wrong",
    message: "We could not process your request. Please try again later.",
};

fn render_page(res: &mut Response, status: StatusCode, page: Page) {
    res.status_code(status);
    res.render(Text::Html(format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{message}</p></body></html>",
        title = page.title,
        message = page.message,
    )));
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use trellis_app::domain::{
        unsubscribe::{MockUnsubscribeService, TokenError},
        users::records::UserUuid,
    };

    use crate::test_helpers::{Mocks, anonymous_service};

    use super::*;

    fn make_service(unsubscribe: MockUnsubscribeService) -> Service {
        anonymous_service(
            Mocks {
                unsubscribe,
                ..Mocks::default()
            },
            Router::with_path("email/unsubscribe").get(handler),
        )
    }

    #[tokio::test]
    async fn test_valid_token_renders_confirmation() -> TestResult {
        let mut unsubscribe = MockUnsubscribeService::new();

        unsubscribe
            .expect_unsubscribe()
            .once()
            .withf(|token| token == "abc")
            .return_once(|_| Ok(UserUuid::new()));

        let mut res = TestClient::get("http://example.com/email/unsubscribe?token=abc")
            .send(&make_service(unsubscribe))
            .await;

        let body = res.take_string().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.contains(UNSUBSCRIBED.message), "got {body}");

        Ok(())
    }

    #[tokio::test]
    async fn test_expired_token_renders_error_page() -> TestResult {
        let mut unsubscribe = MockUnsubscribeService::new();

        unsubscribe
            .expect_unsubscribe()
            .once()
            .return_once(|_| Err(UnsubscribeServiceError::InvalidToken(TokenError::Expired)));

        let mut res = TestClient::get("http://example.com/email/unsubscribe?token=old")
            .send(&make_service(unsubscribe))
            .await;

        let body = res.take_string().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert!(body.contains(INVALID_LINK.message), "got {body}");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_token_never_reaches_the_service() -> TestResult {
        let mut unsubscribe = MockUnsubscribeService::new();

        unsubscribe.expect_unsubscribe().never();

        let res = TestClient::get("http://example.com/email/unsubscribe")
            .send(&make_service(unsubscribe))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_user_returns_404() -> TestResult {
        let mut unsubscribe = MockUnsubscribeService::new();

        unsubscribe
            .expect_unsubscribe()
            .once()
            .return_once(|_| Err(UnsubscribeServiceError::NotFound));

        let res = TestClient::get("http://example.com/email/unsubscribe?token=abc")
            .send(&make_service(unsubscribe))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
