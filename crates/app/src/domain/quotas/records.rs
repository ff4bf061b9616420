//! Quota Records

use jiff::civil::Date;

use crate::domain::{quotas::ledger::QuotaLedger, users::records::UserUuid};

/// Quota Ledger Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaLedgerRecord {
    pub user_uuid: UserUuid,
    pub paid_balance: u64,
    pub free_used_today: u32,
    pub last_activity_date: Option<Date>,
}

impl QuotaLedgerRecord {
    #[must_use]
    pub fn ledger(&self) -> QuotaLedger {
        QuotaLedger {
            paid_balance: self.paid_balance,
            free_used_today: self.free_used_today,
            last_activity_date: self.last_activity_date,
        }
    }
}

/// A user's quota as seen on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSummary {
    pub free_allowance: u32,
    pub free_remaining: u32,
    pub paid_balance: u64,
}
