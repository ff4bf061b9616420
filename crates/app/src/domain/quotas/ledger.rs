//! Quota accounting.

use std::{fmt, str::FromStr};

use jiff::{Timestamp, civil::Date, tz::{Offset, TimeZone}};
use thiserror::Error;

use crate::domain::status::UnknownVariant;

/// Free invitations granted per user per calendar day.
pub const DAILY_FREE_ALLOWANCE: u32 = 5;

/// Which pool an invitation was paid from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostType {
    Free,
    Paid,
}

impl CostType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for CostType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free" => Ok(Self::Free),
            "paid" => Ok(Self::Paid),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Neither the free allowance nor the paid balance can cover another invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no free or paid invitations remaining")]
pub struct QuotaExhausted;

/// A user's quota counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaLedger {
    pub paid_balance: u64,
    pub free_used_today: u32,
    pub last_activity_date: Option<Date>,
}

impl QuotaLedger {
    /// The ledger with the daily counter reset if `today` is a new day.
    #[must_use]
    pub fn as_of(self, today: Date) -> Self {
        match self.last_activity_date {
            Some(last) if last >= today => self,
            _ => Self {
                free_used_today: 0,
                ..self
            },
        }
    }

    #[must_use]
    pub fn free_remaining(self, today: Date) -> u32 {
        DAILY_FREE_ALLOWANCE.saturating_sub(self.as_of(today).free_used_today)
    }

    /// Spend one invitation, free allowance first.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaExhausted`] when both pools are empty.
    pub fn consume(self, today: Date) -> Result<(Self, CostType), QuotaExhausted> {
        let current = self.as_of(today);

        if current.free_used_today < DAILY_FREE_ALLOWANCE {
            let next = Self {
                free_used_today: current.free_used_today + 1,
                last_activity_date: Some(today),
                ..current
            };

            return Ok((next, CostType::Free));
        }

        if current.paid_balance > 0 {
            let next = Self {
                paid_balance: current.paid_balance - 1,
                last_activity_date: Some(today),
                ..current
            };

            return Ok((next, CostType::Paid));
        }

        Err(QuotaExhausted)
    }
}

/// The calendar date at `now` in a fixed UTC offset.
#[must_use]
pub fn today_at(now: Timestamp, offset: Offset) -> Date {
    now.to_zoned(TimeZone::fixed(offset)).date()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    const TODAY: Date = date(2026, 10, 19);
    const YESTERDAY: Date = date(2026, 10, 18);

    #[test]
    fn free_allowance_is_spent_before_paid_balance() -> TestResult {
        let mut ledger = QuotaLedger {
            paid_balance: 2,
            ..QuotaLedger::default()
        };

        for _ in 0..DAILY_FREE_ALLOWANCE {
            let (next, cost) = ledger.consume(TODAY)?;

            assert_eq!(cost, CostType::Free);
            assert_eq!(next.paid_balance, 2);

            ledger = next;
        }

        let (next, cost) = ledger.consume(TODAY)?;

        assert_eq!(cost, CostType::Paid);
        assert_eq!(next.paid_balance, 1);
        assert_eq!(next.free_used_today, DAILY_FREE_ALLOWANCE);

        Ok(())
    }

    #[test]
    fn exhausted_ledger_is_rejected() {
        let ledger = QuotaLedger {
            paid_balance: 0,
            free_used_today: DAILY_FREE_ALLOWANCE,
            last_activity_date: Some(TODAY),
        };

        assert_eq!(ledger.consume(TODAY), Err(QuotaExhausted));
    }

    #[test]
    fn new_day_resets_free_counter() -> TestResult {
        let ledger = QuotaLedger {
            paid_balance: 0,
            free_used_today: DAILY_FREE_ALLOWANCE,
            last_activity_date: Some(YESTERDAY),
        };

        assert_eq!(ledger.free_remaining(TODAY), DAILY_FREE_ALLOWANCE);

        let (next, cost) = ledger.consume(TODAY)?;

        assert_eq!(cost, CostType::Free);
        assert_eq!(next.free_used_today, 1);
        assert_eq!(next.last_activity_date, Some(TODAY));

        Ok(())
    }

    #[test]
    fn missing_activity_date_counts_as_new_day() {
        let ledger = QuotaLedger {
            paid_balance: 0,
            free_used_today: 3,
            last_activity_date: None,
        };

        assert_eq!(ledger.as_of(TODAY).free_used_today, 0);
    }

    #[test]
    fn paid_consumption_stamps_activity_date() -> TestResult {
        let ledger = QuotaLedger {
            paid_balance: 1,
            free_used_today: DAILY_FREE_ALLOWANCE,
            last_activity_date: Some(TODAY),
        };

        let (next, cost) = ledger.consume(TODAY)?;

        assert_eq!(cost, CostType::Paid);
        assert_eq!(next.paid_balance, 0);
        assert_eq!(next.last_activity_date, Some(TODAY));

        Ok(())
    }

    #[test]
    fn today_follows_configured_offset() -> TestResult {
        let now: Timestamp = "2026-10-18T17:30:00Z".parse()?;

        assert_eq!(today_at(now, Offset::UTC), YESTERDAY);
        assert_eq!(today_at(now, Offset::constant(8)), TODAY);

        Ok(())
    }
}
