//! Quota Config

use clap::Args;

/// Invitation quota settings.
#[derive(Debug, Args)]
pub struct QuotaConfig {
    /// UTC offset in hours at which the daily free allowance resets
    #[arg(
        long,
        env = "QUOTA_DAY_OFFSET_HOURS",
        default_value_t = 8_i8,
        allow_negative_numbers = true
    )]
    pub quota_day_offset_hours: i8,
}
