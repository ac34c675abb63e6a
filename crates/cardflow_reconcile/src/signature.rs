//! Normalized day-entry signature comparison, shared by conflict
//! classification, the approval protocol, and the locked-day edit check.

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySignature {
    pub from_time: Option<NaiveTime>,
    pub to_time: Option<NaiveTime>,
    pub total_hours: Option<Decimal>,
}

impl EntrySignature {
    pub fn new(from_time: Option<NaiveTime>, to_time: Option<NaiveTime>, total_hours: Option<Decimal>) -> Self {
        Self {
            from_time: from_time.map(truncate_to_minute),
            to_time: to_time.map(truncate_to_minute),
            total_hours: total_hours.map(|hours| hours.round_dp(2)),
        }
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

impl From<&cardflow_db::WorkCardDayEntry> for EntrySignature {
    fn from(entry: &cardflow_db::WorkCardDayEntry) -> Self {
        EntrySignature::new(entry.from_time, entry.to_time, entry.total_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn signature_ignores_seconds_and_rounds_hours() {
        let a = EntrySignature::new(
            NaiveTime::from_hms_opt(8, 0, 30),
            NaiveTime::from_hms_opt(17, 0, 0),
            Some(Decimal::new(9004, 3)),
        );
        let b = EntrySignature::new(
            NaiveTime::from_hms_opt(8, 0, 0),
            NaiveTime::from_hms_opt(17, 0, 0),
            Some(Decimal::new(900, 2)),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn differing_totals_are_not_equal() {
        let a = EntrySignature::new(None, None, Some(Decimal::new(800, 2)));
        let b = EntrySignature::new(None, None, Some(Decimal::new(900, 2)));
        assert_ne!(a, b);
    }
}
