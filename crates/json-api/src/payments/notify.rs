//! Payment Notification Handler
//!
//! The gateway retries delivery until it receives a `SUCCESS` acknowledgement,
//! so every outcome that needs no redelivery is acknowledged with 200.

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use trellis_app::domain::payments::{
    PaymentsServiceError, gateway::NotificationRequest, records::NotificationOutcome,
};

use crate::{observability::observe_notification, state::State};

pub(crate) const SIGNATURE_HEADER: &str = "wechatpay-signature";
pub(crate) const TIMESTAMP_HEADER: &str = "wechatpay-timestamp";
pub(crate) const NONCE_HEADER: &str = "wechatpay-nonce";

const ACK_SUCCESS: &str = "SUCCESS";
const ACK_FAIL: &str = "FAIL";

/// Acknowledgement body understood by the gateway.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct NotificationAck {
    /// `SUCCESS` or `FAIL`
    pub code: String,

    pub message: String,
}

impl NotificationAck {
    fn success() -> Self {
        Self {
            code: ACK_SUCCESS.to_string(),
            message: "OK".to_string(),
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            code: ACK_FAIL.to_string(),
            message: message.to_string(),
        }
    }
}

/// Payment Notification Handler
///
/// Verifies a signed gateway notification and settles the order it refers to.
#[endpoint(
    tags("payments"),
    summary = "Payment Notification",
    responses(
        (status_code = StatusCode::OK, description = "Notification handled"),
        (status_code = StatusCode::BAD_REQUEST, description = "Notification failed verification"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Notification should be redelivered"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Json<NotificationAck> {
    let Ok(state) = depot.obtain::<Arc<State>>() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return Json(NotificationAck::fail("internal error"));
    };

    let notification = match read_notification(req).await {
        Ok(notification) => notification,
        Err(message) => {
            warn!("rejected payment notification: {message}");
            observe_notification("malformed");
            res.status_code(StatusCode::BAD_REQUEST);

            return Json(NotificationAck::fail(message));
        }
    };

    match state.app.payments.handle_notification(notification).await {
        Ok(outcome) => {
            observe_notification(outcome.as_str());
            log_outcome(outcome);

            Json(NotificationAck::success())
        }
        Err(PaymentsServiceError::InvalidSignature(source)) => {
            warn!("payment notification failed verification: {source}");
            observe_notification("invalid_signature");
            res.status_code(StatusCode::BAD_REQUEST);

            Json(NotificationAck::fail("invalid signature"))
        }
        Err(PaymentsServiceError::Sql(source)) => {
            error!("failed to apply payment notification: {source}");
            observe_notification("error");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

            Json(NotificationAck::fail("internal error"))
        }
    }
}

async fn read_notification(req: &mut Request) -> Result<NotificationRequest, &'static str> {
    let signature = req
        .header::<String>(SIGNATURE_HEADER)
        .ok_or("missing signature header")?;
    let timestamp = req
        .header::<String>(TIMESTAMP_HEADER)
        .ok_or("missing timestamp header")?;
    let nonce = req
        .header::<String>(NONCE_HEADER)
        .ok_or("missing nonce header")?;

    let payload = req
        .payload()
        .await
        .map_err(|_ignored| "unreadable body")?;

    let body = String::from_utf8(payload.to_vec()).map_err(|_ignored| "body is not utf-8")?;

    Ok(NotificationRequest {
        signature,
        timestamp,
        nonce,
        body,
    })
}

fn log_outcome(outcome: NotificationOutcome) {
    match outcome {
        NotificationOutcome::Applied => info!(outcome = outcome.as_str(), "order settled"),
        NotificationOutcome::AlreadyPaid | NotificationOutcome::TradeNotSuccessful => {
            info!(outcome = outcome.as_str(), "payment notification acknowledged");
        }
        NotificationOutcome::OrderNotPayable
        | NotificationOutcome::UnknownOrder
        | NotificationOutcome::ForeignTradeNumber => {
            warn!(outcome = outcome.as_str(), "payment notification ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use trellis_app::domain::payments::{MockPaymentsService, gateway::GatewayError};

    use crate::test_helpers::{Mocks, anonymous_service};

    use super::*;

    const BODY: &str = r#"{"out_trade_no":"TR1_abc","trade_state":"SUCCESS"}"#;

    fn make_service(payments: MockPaymentsService) -> Service {
        anonymous_service(
            Mocks {
                payments,
                ..Mocks::default()
            },
            Router::with_path("payments/notify").post(handler),
        )
    }

    fn signed_request() -> salvo::test::RequestBuilder {
        TestClient::post("http://example.com/payments/notify")
            .add_header(SIGNATURE_HEADER, "deadbeef", true)
            .add_header(TIMESTAMP_HEADER, "1700000000", true)
            .add_header(NONCE_HEADER, "nonce-1", true)
            .text(BODY)
    }

    #[tokio::test]
    async fn test_notification_is_forwarded_and_acknowledged() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_handle_notification()
            .once()
            .withf(|notification| {
                *notification
                    == NotificationRequest {
                        signature: "deadbeef".to_string(),
                        timestamp: "1700000000".to_string(),
                        nonce: "nonce-1".to_string(),
                        body: BODY.to_string(),
                    }
            })
            .return_once(|_| Ok(NotificationOutcome::Applied));

        let mut res = signed_request().send(&make_service(payments)).await;
        let ack: NotificationAck = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(ack.code, ACK_SUCCESS);

        Ok(())
    }

    #[tokio::test]
    async fn test_business_no_ops_are_acknowledged() -> TestResult {
        for outcome in [
            NotificationOutcome::AlreadyPaid,
            NotificationOutcome::OrderNotPayable,
            NotificationOutcome::UnknownOrder,
            NotificationOutcome::ForeignTradeNumber,
            NotificationOutcome::TradeNotSuccessful,
        ] {
            let mut payments = MockPaymentsService::new();

            payments
                .expect_handle_notification()
                .once()
                .return_once(move |_| Ok(outcome));

            let mut res = signed_request().send(&make_service(payments)).await;
            let ack: NotificationAck = res.take_json().await?;

            assert_eq!(res.status_code, Some(StatusCode::OK), "{outcome:?}");
            assert_eq!(ack.code, ACK_SUCCESS, "{outcome:?}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_signature_returns_400_fail() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_handle_notification()
            .once()
            .return_once(|_| {
                Err(PaymentsServiceError::InvalidSignature(
                    GatewayError::InvalidSignature,
                ))
            });

        let mut res = signed_request().send(&make_service(payments)).await;
        let ack: NotificationAck = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(ack.code, ACK_FAIL);

        Ok(())
    }

    #[tokio::test]
    async fn test_internal_failure_returns_500_fail() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments
            .expect_handle_notification()
            .once()
            .return_once(|_| Err(PaymentsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let mut res = signed_request().send(&make_service(payments)).await;
        let ack: NotificationAck = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(ack.code, ACK_FAIL);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_signature_headers_never_reach_the_service() -> TestResult {
        let mut payments = MockPaymentsService::new();

        payments.expect_handle_notification().never();

        let mut res = TestClient::post("http://example.com/payments/notify")
            .text(BODY)
            .send(&make_service(payments))
            .await;

        let ack: NotificationAck = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(ack.code, ACK_FAIL);

        Ok(())
    }
}
