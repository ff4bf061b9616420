//! Mail Relay Config

use std::time::Duration;

use clap::Args;

use trellis_app::mail::MailConfig;

/// Outgoing mail relay settings. Leaving the relay URL unset disables mail.
#[derive(Debug, Args)]
pub struct MailSettings {
    /// HTTP mail relay endpoint
    #[arg(long, env = "MAIL_RELAY_URL")]
    pub mail_relay_url: Option<String>,

    /// Bearer token for the mail relay
    #[arg(long, env = "MAIL_API_TOKEN", default_value = "", hide_env_values = true)]
    pub mail_api_token: String,

    /// Sender address
    #[arg(long, env = "MAIL_FROM_ADDRESS", default_value = "no-reply@trellis.local")]
    pub mail_from_address: String,

    /// Sender display name
    #[arg(long, env = "MAIL_FROM_NAME", default_value = "Trellis")]
    pub mail_from_name: String,

    /// Relay request timeout in seconds
    #[arg(long, env = "MAIL_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub mail_timeout_seconds: u64,
}

impl MailSettings {
    #[must_use]
    pub fn mail_config(&self) -> Option<MailConfig> {
        let relay_url = self
            .mail_relay_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())?;

        Some(MailConfig {
            relay_url: relay_url.to_string(),
            api_token: self.mail_api_token.clone(),
            from_address: self.mail_from_address.clone(),
            from_name: self.mail_from_name.clone(),
            timeout: Duration::from_secs(self.mail_timeout_seconds),
        })
    }
}
