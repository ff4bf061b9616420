//! Server configuration module

use clap::Parser;
use jiff::tz::Offset;

use trellis_app::context::AppConfig;

use crate::config::{
    db::DatabaseConfig,
    mail::MailSettings,
    observability::{LoggingConfig, ObservabilityConfig},
    payments::PaymentsConfig,
    promotions::PromotionSettings,
    quota::QuotaConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod mail;
pub(crate) mod observability;
pub(crate) mod payments;
pub(crate) mod promotions;
pub(crate) mod quota;
pub(crate) mod server;

/// Trellis JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "trellis-json", about = "Trellis JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Payment gateway settings.
    #[command(flatten)]
    pub payments: PaymentsConfig,

    /// Outgoing mail relay settings.
    #[command(flatten)]
    pub mail: MailSettings,

    /// Email promotion settings.
    #[command(flatten)]
    pub promotions: PromotionSettings,

    /// Invitation quota settings.
    #[command(flatten)]
    pub quota: QuotaConfig,
}

/// Configuration that parses but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("quota day offset of {0} hours is out of range")]
    QuotaOffset(i8),
}

/// Value parser for secrets: empty or whitespace-only values are refused.
fn non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("must not be empty or blank".to_string());
    }

    Ok(value.to_string())
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings for assembling the application services.
    ///
    /// # Errors
    ///
    /// Returns an error if the quota day offset is not a valid UTC offset.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        let quota_day_offset = Offset::from_hours(self.quota.quota_day_offset_hours)
            .map_err(|_ignored| ConfigError::QuotaOffset(self.quota.quota_day_offset_hours))?;

        Ok(AppConfig {
            gateway: self.payments.gateway_config(),
            mail: self.mail.mail_config(),
            promotions: self.promotions.promotions_config(),
            quota_day_offset,
            migrate: self.database.migrate,
            pool: self.database.pool_config(),
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const REQUIRED: [&str; 15] = [
        "trellis-json",
        "--database-url",
        "postgres://localhost/trellis",
        "--payments-app-id",
        "wx-app",
        "--payments-merchant-id",
        "mch-1",
        "--payments-api-key",
        "api-key",
        "--payments-notification-secret",
        "notify-secret",
        "--payments-notify-url",
        "https://trellis.test/payments/notify",
        "--unsubscribe-secret",
        "unsubscribe-secret",
    ];

    fn parse(extra: &[&str]) -> Result<ServerConfig, clap::Error> {
        ServerConfig::try_parse_from(REQUIRED.iter().chain(extra))
    }

    /// Required arguments with the value following `flag` swapped for `value`.
    fn parse_overriding(flag: &str, value: &str) -> Result<ServerConfig, clap::Error> {
        let mut args = REQUIRED.to_vec();
        let position = args.iter().position(|arg| *arg == flag);

        if let Some(slot) = position.and_then(|index| args.get_mut(index + 1)) {
            *slot = value;
        }

        ServerConfig::try_parse_from(args)
    }

    #[test]
    fn promotion_sweep_interval_defaults_to_a_minute() -> TestResult {
        let config = parse(&[])?;

        assert_eq!(
            config.app_config()?.promotions.sweep_interval,
            std::time::Duration::from_secs(60)
        );

        Ok(())
    }

    #[test]
    fn blank_secrets_are_rejected() {
        for flag in [
            "--payments-api-key",
            "--payments-notification-secret",
            "--unsubscribe-secret",
        ] {
            for value in ["", "   "] {
                assert!(
                    parse_overriding(flag, value).is_err(),
                    "{flag} {value:?} should not parse"
                );
            }
        }
    }

    #[test]
    fn secrets_are_kept_verbatim() -> TestResult {
        let config = parse_overriding("--unsubscribe-secret", " padded ")?;

        assert_eq!(config.app_config()?.promotions.unsubscribe_secret, " padded ");

        Ok(())
    }

    #[test]
    fn mail_is_optional() -> TestResult {
        let config = parse(&[])?;

        assert!(config.app_config()?.mail.is_none());

        Ok(())
    }

    #[test]
    fn mail_is_configured_when_relay_url_is_given() -> TestResult {
        let config = parse(&["--mail-relay-url", "https://relay.test/send"])?;
        let mail = config.app_config()?.mail;

        assert_eq!(
            mail.map(|mail| mail.relay_url),
            Some("https://relay.test/send".to_string())
        );

        Ok(())
    }

    #[test]
    fn quota_day_offset_defaults_to_utc_plus_eight() -> TestResult {
        let config = parse(&[])?;

        assert_eq!(config.app_config()?.quota_day_offset, Offset::constant(8));

        Ok(())
    }

    #[test]
    fn quota_day_offset_out_of_range_is_rejected() -> TestResult {
        let config = parse(&["--quota-day-offset-hours", "30"])?;
        let result = config.app_config();

        assert!(
            matches!(result, Err(ConfigError::QuotaOffset(30))),
            "expected QuotaOffset, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn send_delay_is_read_in_milliseconds() -> TestResult {
        let config = parse(&["--promotion-send-delay-ms", "250"])?;

        assert_eq!(
            config.app_config()?.promotions.send_delay,
            std::time::Duration::from_millis(250)
        );

        Ok(())
    }

    #[test]
    fn pool_is_sized_from_flags() -> TestResult {
        let config = parse(&[
            "--database-max-connections",
            "25",
            "--database-acquire-timeout-seconds",
            "2",
        ])?;

        let pool = config.app_config()?.pool;

        assert_eq!(pool.max_connections, 25);
        assert_eq!(pool.acquire_timeout, std::time::Duration::from_secs(2));

        Ok(())
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(parse(&["--database-max-connections", "0"]).is_err());
    }
}
