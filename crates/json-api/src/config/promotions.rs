//! Email Promotion Config

use std::time::Duration;

use clap::Args;

use trellis_app::context::PromotionsConfig;

/// Email promotion settings.
#[derive(Debug, Args)]
pub struct PromotionSettings {
    /// Root of the public site, used in project and unsubscribe links
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:8698")]
    pub public_base_url: String,

    /// Key unsubscribe links are signed with
    #[arg(
        long,
        env = "UNSUBSCRIBE_SECRET",
        hide_env_values = true,
        value_parser = super::non_blank
    )]
    pub unsubscribe_secret: String,

    /// Pause between individual promotion emails
    #[arg(long, env = "PROMOTION_SEND_DELAY_MS", default_value_t = 100_u64)]
    pub promotion_send_delay_ms: u64,

    /// How often pending promotions that never reached the runner are started
    #[arg(long, env = "PROMOTION_SWEEP_INTERVAL_SECONDS", default_value_t = 60_u64)]
    pub promotion_sweep_interval_seconds: u64,

    /// How long shutdown waits for running campaigns
    #[arg(long, env = "PROMOTION_SHUTDOWN_GRACE_SECONDS", default_value_t = 30_u64)]
    pub promotion_shutdown_grace_seconds: u64,
}

impl PromotionSettings {
    #[must_use]
    pub fn promotions_config(&self) -> PromotionsConfig {
        PromotionsConfig {
            public_base_url: self.public_base_url.clone(),
            unsubscribe_secret: self.unsubscribe_secret.clone(),
            send_delay: Duration::from_millis(self.promotion_send_delay_ms),
            sweep_interval: Duration::from_secs(self.promotion_sweep_interval_seconds),
        }
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.promotion_shutdown_grace_seconds)
    }
}
