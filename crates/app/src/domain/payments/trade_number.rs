//! Merchant trade numbers.
//!
//! A trade number is `TR{unix_seconds}_{order_uuid_simple}`. The timestamp
//! keeps repeated payment attempts for one order distinct at the gateway; the
//! order is recovered from the suffix when the notification arrives.

use jiff::Timestamp;
use uuid::Uuid;

use crate::domain::orders::records::OrderUuid;

const PREFIX: &str = "TR";

/// Build the trade number for a payment attempt on `order` made at `at`.
#[must_use]
pub fn trade_number_for(order: OrderUuid, at: Timestamp) -> String {
    format!("{PREFIX}{}_{}", at.as_second(), order.into_uuid().simple())
}

/// Recover the order from a trade number, if it is one of ours.
#[must_use]
pub fn parse_trade_number(trade_number: &str) -> Option<OrderUuid> {
    let rest = trade_number.strip_prefix(PREFIX)?;
    let (seconds, order) = rest.split_once('_')?;

    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Uuid::try_parse(order).ok().map(OrderUuid::from_uuid)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn trade_number_embeds_order() -> TestResult {
        let order = OrderUuid::new();
        let at: Timestamp = "2026-10-19T02:00:00Z".parse()?;

        let trade_number = trade_number_for(order, at);

        assert!(trade_number.starts_with("TR1792375200_"), "got {trade_number}");
        assert_eq!(parse_trade_number(&trade_number), Some(order));

        Ok(())
    }

    #[test]
    fn foreign_trade_numbers_do_not_parse() {
        for candidate in [
            "",
            "TR",
            "KZ1700000000_1",
            "TR1700000000",
            "TR_0190f0e2c1d47c3a8b5e6f7a8b9c0d1e",
            "TRabc_0190f0e2c1d47c3a8b5e6f7a8b9c0d1e",
            "TR1700000000_not-a-uuid",
        ] {
            assert_eq!(parse_trade_number(candidate), None, "{candidate:?} should not parse");
        }
    }
}
