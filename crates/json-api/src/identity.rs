//! Caller identity middleware.
//!
//! Authentication happens upstream; the gateway in front of this service
//! forwards the verified user id and, when known, their payment identity.

use salvo::prelude::*;
use uuid::Uuid;

use trellis_app::domain::users::records::UserUuid;

use crate::extensions::*;

pub(crate) const USER_UUID_HEADER: &str = "x-user-uuid";
pub(crate) const PAYER_IDENTITY_HEADER: &str = "x-user-openid";

/// The user a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Caller {
    pub(crate) user_uuid: UserUuid,

    /// Identity of the user with the payment gateway.
    pub(crate) payer_identity: Option<String>,
}

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(user_uuid) = extract_user_uuid(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid user identity"));
        ctrl.skip_rest();

        return;
    };

    let payer_identity = req
        .header::<String>(PAYER_IDENTITY_HEADER)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    depot.insert_caller(Caller {
        user_uuid,
        payer_identity,
    });

    ctrl.call_next(req, depot, res).await;
}

fn extract_user_uuid(req: &Request) -> Option<UserUuid> {
    let value = req.headers().get(USER_UUID_HEADER)?.to_str().ok()?;
    let uuid = Uuid::parse_str(value.trim()).ok()?;

    (!uuid.is_nil()).then(|| UserUuid::from_uuid(uuid))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use super::*;

    #[salvo::handler]
    async fn echo_caller(depot: &mut Depot, res: &mut Response) {
        let caller = depot.caller().map_or_else(
            || "missing".to_string(),
            |caller| {
                format!(
                    "{} {}",
                    caller.user_uuid,
                    caller.payer_identity.as_deref().unwrap_or("-")
                )
            },
        );

        res.render(caller);
    }

    fn make_service() -> Service {
        Service::new(Router::new().hoop(handler).push(Router::new().get(echo_caller)))
    }

    #[tokio::test]
    async fn test_missing_user_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_user_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(USER_UUID_HEADER, "42", true)
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_nil_user_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(USER_UUID_HEADER, Uuid::nil().to_string(), true)
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_valid_headers_inject_caller() -> TestResult {
        let user = Uuid::now_v7();

        let mut res = TestClient::get("http://example.com")
            .add_header(USER_UUID_HEADER, user.to_string(), true)
            .add_header(PAYER_IDENTITY_HEADER, "openid-1", true)
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, format!("{user} openid-1"));

        Ok(())
    }

    #[tokio::test]
    async fn test_blank_payer_identity_is_dropped() -> TestResult {
        let user = Uuid::now_v7();

        let mut res = TestClient::get("http://example.com")
            .add_header(USER_UUID_HEADER, user.to_string(), true)
            .add_header(PAYER_IDENTITY_HEADER, "  ", true)
            .send(&make_service())
            .await;

        assert_eq!(res.take_string().await?, format!("{user} -"));

        Ok(())
    }
}
