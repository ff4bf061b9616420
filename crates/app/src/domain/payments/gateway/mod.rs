//! Payment gateway adapter.
//!
//! The gateway creates prepay transactions for the client SDK and signs the
//! asynchronous notifications it later delivers to us.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signing::SigningKeyError;

mod http;

pub use http::{GatewayConfig, HttpPaymentGateway};

/// Trade state the gateway reports for a settled payment.
pub const TRADE_STATE_SUCCESS: &str = "SUCCESS";

/// A request to open a prepay transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepayRequest {
    pub trade_number: String,
    pub description: String,

    /// Amount in minor currency units.
    pub amount: u64,

    /// The payer's identity with the gateway (e.g. an open id).
    pub payer_identity: String,
}

/// Signed parameters the client SDK needs to present the payment sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPaymentParams {
    pub time_stamp: String,
    pub nonce_str: String,
    pub package: String,
    pub sign_type: String,
    pub pay_sign: String,
}

/// A raw notification as received over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub signature: String,
    pub timestamp: String,
    pub nonce: String,
    pub body: String,
}

/// The transaction described by a verified notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayTransaction {
    pub out_trade_no: String,
    pub trade_state: String,
    pub transaction_id: Option<String>,

    /// RFC 3339 settlement time.
    pub success_time: Option<String>,
}

impl GatewayTransaction {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.trade_state == TRADE_STATE_SUCCESS
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("gateway response did not include a prepay id")]
    MissingPrepayId,

    #[error("notification signature is invalid")]
    InvalidSignature,

    #[error("notification timestamp is outside the accepted window")]
    StaleNotification,

    #[error("failed to encode gateway request")]
    Encode(#[source] serde_json::Error),

    #[error("notification body is malformed")]
    MalformedNotification(#[source] serde_json::Error),

    #[error("invalid signing key")]
    InvalidKey(#[from] SigningKeyError),
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a prepay transaction and return the client-side payment parameters.
    async fn create_prepay(
        &self,
        request: PrepayRequest,
    ) -> Result<ClientPaymentParams, GatewayError>;

    /// Authenticate a notification and decode the transaction it carries.
    async fn verify_notification(
        &self,
        notification: &NotificationRequest,
    ) -> Result<GatewayTransaction, GatewayError>;
}
