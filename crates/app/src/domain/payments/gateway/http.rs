//! HTTP payment gateway client.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use rand::{Rng as _, distributions::Alphanumeric};
use reqwest::{Client, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    domain::payments::gateway::{
        ClientPaymentParams, GatewayError, GatewayTransaction, NotificationRequest,
        PaymentGateway, PrepayRequest,
    },
    signing::MessageSigner,
};

const PREPAY_PATH: &str = "/v3/pay/transactions/jsapi";
const SIGN_TYPE: &str = "HMAC-SHA256";
const CURRENCY: &str = "CNY";
const NONCE_LENGTH: usize = 32;

/// Notifications older or newer than this are rejected.
const NOTIFICATION_TOLERANCE_SECONDS: u64 = 300;

/// Connection settings for the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway API base URL, e.g. `"https://api.mch.example.com"`.
    pub base_url: String,

    pub app_id: String,
    pub merchant_id: String,

    /// Key used to sign outgoing requests and client payment parameters.
    pub api_key: String,

    /// Key the gateway signs notifications with.
    pub notification_secret: String,

    /// Where the gateway should deliver payment notifications.
    pub notify_url: String,

    /// Per-request timeout. Gateway calls are never retried here.
    pub timeout: Duration,
}

/// Payment gateway client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    config: GatewayConfig,
    http: Client,
    request_signer: MessageSigner,
    notification_signer: MessageSigner,
}

impl HttpPaymentGateway {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a key is unusable.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            request_signer: MessageSigner::new(config.api_key.as_bytes())?,
            notification_signer: MessageSigner::new(config.notification_secret.as_bytes())?,
            config,
            http,
        })
    }

    fn client_params(
        &self,
        prepay_id: &str,
        time_stamp: String,
        nonce_str: String,
    ) -> ClientPaymentParams {
        let package = format!("prepay_id={prepay_id}");

        let message = format!(
            "{}\n{time_stamp}\n{nonce_str}\n{package}\n",
            self.config.app_id
        );

        ClientPaymentParams {
            pay_sign: self.request_signer.sign_hex(message.as_bytes()),
            time_stamp,
            nonce_str,
            package,
            sign_type: SIGN_TYPE.to_string(),
        }
    }

    fn verify_notification_at(
        &self,
        notification: &NotificationRequest,
        now: Timestamp,
    ) -> Result<GatewayTransaction, GatewayError> {
        let sent_at: i64 = notification
            .timestamp
            .trim()
            .parse()
            .map_err(|_ignored| GatewayError::InvalidSignature)?;

        if now.as_second().abs_diff(sent_at) > NOTIFICATION_TOLERANCE_SECONDS {
            return Err(GatewayError::StaleNotification);
        }

        let tag = hex::decode(notification.signature.trim())
            .map_err(|_ignored| GatewayError::InvalidSignature)?;

        let message = notification_message(notification);

        if !self.notification_signer.verify(message.as_bytes(), &tag) {
            return Err(GatewayError::InvalidSignature);
        }

        serde_json::from_str(&notification.body).map_err(GatewayError::MalformedNotification)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_prepay(
        &self,
        request: PrepayRequest,
    ) -> Result<ClientPaymentParams, GatewayError> {
        let url = format!("{}{PREPAY_PATH}", self.config.base_url);

        let body = PrepayBody {
            appid: &self.config.app_id,
            mchid: &self.config.merchant_id,
            description: &request.description,
            out_trade_no: &request.trade_number,
            notify_url: &self.config.notify_url,
            amount: PrepayAmount {
                total: request.amount,
                currency: CURRENCY,
            },
            payer: PrepayPayer {
                openid: &request.payer_identity,
            },
        };

        let payload = serde_json::to_vec(&body).map_err(GatewayError::Encode)?;
        let signature = self.request_signer.sign_hex(&payload);

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("x-merchant-id", &self.config.merchant_id)
            .header("x-signature", signature)
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            return Err(GatewayError::Rejected { status, body });
        }

        let parsed: PrepayResponse = response.json().await?;

        let prepay_id = parsed
            .prepay_id
            .filter(|id| !id.is_empty())
            .ok_or(GatewayError::MissingPrepayId)?;

        debug!(trade_number = %request.trade_number, "created prepay transaction");

        Ok(self.client_params(
            &prepay_id,
            Timestamp::now().as_second().to_string(),
            generate_nonce(),
        ))
    }

    async fn verify_notification(
        &self,
        notification: &NotificationRequest,
    ) -> Result<GatewayTransaction, GatewayError> {
        self.verify_notification_at(notification, Timestamp::now())
    }
}

fn notification_message(notification: &NotificationRequest) -> String {
    format!(
        "{}\n{}\n{}\n",
        notification.timestamp, notification.nonce, notification.body
    )
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

#[derive(Debug, Serialize)]
struct PrepayBody<'a> {
    appid: &'a str,
    mchid: &'a str,
    description: &'a str,
    out_trade_no: &'a str,
    notify_url: &'a str,
    amount: PrepayAmount,
    payer: PrepayPayer<'a>,
}

#[derive(Debug, Serialize)]
struct PrepayAmount {
    total: u64,
    currency: &'static str,
}

#[derive(Debug, Serialize)]
struct PrepayPayer<'a> {
    openid: &'a str,
}

#[derive(Debug, Deserialize)]
struct PrepayResponse {
    prepay_id: Option<String>,
}
