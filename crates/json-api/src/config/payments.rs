//! Payment Gateway Config

use std::time::Duration;

use clap::Args;

use trellis_app::domain::payments::gateway::GatewayConfig;

/// Payment gateway settings.
#[derive(Debug, Args)]
pub struct PaymentsConfig {
    /// Gateway API base URL
    #[arg(
        long,
        env = "PAYMENTS_BASE_URL",
        default_value = "https://api.mch.weixin.qq.com"
    )]
    pub payments_base_url: String,

    /// Application id registered with the gateway
    #[arg(long, env = "PAYMENTS_APP_ID")]
    pub payments_app_id: String,

    /// Merchant id registered with the gateway
    #[arg(long, env = "PAYMENTS_MERCHANT_ID")]
    pub payments_merchant_id: String,

    /// Key used to sign gateway requests
    #[arg(
        long,
        env = "PAYMENTS_API_KEY",
        hide_env_values = true,
        value_parser = super::non_blank
    )]
    pub payments_api_key: String,

    /// Key the gateway signs notifications with
    #[arg(
        long,
        env = "PAYMENTS_NOTIFICATION_SECRET",
        hide_env_values = true,
        value_parser = super::non_blank
    )]
    pub payments_notification_secret: String,

    /// Public URL the gateway delivers payment notifications to
    #[arg(long, env = "PAYMENTS_NOTIFY_URL")]
    pub payments_notify_url: String,

    /// Gateway request timeout in seconds
    #[arg(long, env = "PAYMENTS_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub payments_timeout_seconds: u64,
}

impl PaymentsConfig {
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.payments_base_url.trim_end_matches('/').to_string(),
            app_id: self.payments_app_id.clone(),
            merchant_id: self.payments_merchant_id.clone(),
            api_key: self.payments_api_key.clone(),
            notification_secret: self.payments_notification_secret.clone(),
            notify_url: self.payments_notify_url.clone(),
            timeout: Duration::from_secs(self.payments_timeout_seconds),
        }
    }
}
