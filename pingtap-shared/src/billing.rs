//! Billing period arithmetic
//!
//! Pure date and money helpers shared by the subscription handlers, the
//! payment flows and the invoice builder. Nothing here touches the database.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::models::subscription::BillingCycle;

/// Longest extension an admin may grant in one step
pub const MAX_EXTENSION_DAYS: i64 = 3650;

/// End of a period of `cycle` starting at `start`
///
/// Calendar months are added, clamping to the last day of shorter months
/// (31 Jan + 1 month = 28/29 Feb).
pub fn cycle_end(start: DateTime<Utc>, cycle: BillingCycle) -> DateTime<Utc> {
    add_months(start, cycle.months())
}

/// New end date for an admin extension of `days`
///
/// An expired subscription is extended from `now`, a running one from its
/// current end so no paid time is lost.
pub fn extended_end_date(
    current_end: DateTime<Utc>,
    now: DateTime<Utc>,
    days: i64,
) -> DateTime<Utc> {
    current_end.max(now) + Duration::days(days)
}

/// One-month usage window containing `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Current monthly usage window of a subscription that began at `start_date`
///
/// The window start is `start_date` advanced by whole months while the next
/// boundary is not after `now`; the window spans one month from there. A
/// subscription that has not started yet reports its first month.
pub fn current_cycle(start_date: DateTime<Utc>, now: DateTime<Utc>) -> CycleWindow {
    let mut months = 0u32;
    let mut window_start = start_date;

    loop {
        let next = add_months(start_date, months + 1);
        if next > now {
            break;
        }
        months += 1;
        window_start = next;
    }

    CycleWindow {
        start: window_start,
        end: add_months(start_date, months + 1),
    }
}

fn add_months(at: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    at.checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Formats paise as rupees with two decimals: `129900` -> `"1299.00"`
pub fn format_rupees(paise: i64) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_cycle_end_by_cycle() {
        let start = at(2025, 1, 15);
        assert_eq!(cycle_end(start, BillingCycle::Monthly), at(2025, 2, 15));
        assert_eq!(cycle_end(start, BillingCycle::Quarterly), at(2025, 4, 15));
        assert_eq!(cycle_end(start, BillingCycle::Yearly), at(2026, 1, 15));
    }

    #[test]
    fn test_cycle_end_clamps_short_month() {
        assert_eq!(cycle_end(at(2025, 1, 31), BillingCycle::Monthly), at(2025, 2, 28));
    }

    #[test]
    fn test_extension_from_future_end() {
        let now = at(2025, 3, 1);
        let end = at(2025, 3, 20);
        assert_eq!(extended_end_date(end, now, 10), at(2025, 3, 30));
    }

    #[test]
    fn test_extension_of_expired_starts_now() {
        let now = at(2025, 3, 1);
        let end = at(2025, 2, 1);
        assert_eq!(extended_end_date(end, now, 30), at(2025, 3, 31));
    }

    #[test]
    fn test_current_cycle_advances_whole_months() {
        let start = at(2025, 1, 10);
        let window = current_cycle(start, at(2025, 3, 20));
        assert_eq!(window.start, at(2025, 3, 10));
        assert_eq!(window.end, at(2025, 4, 10));
    }

    #[test]
    fn test_current_cycle_on_boundary() {
        let start = at(2025, 1, 10);
        let window = current_cycle(start, at(2025, 2, 10));
        assert_eq!(window.start, at(2025, 2, 10));
        assert_eq!(window.end, at(2025, 3, 10));
    }

    #[test]
    fn test_current_cycle_before_start() {
        let start = at(2025, 5, 1);
        let window = current_cycle(start, at(2025, 4, 1));
        assert_eq!(window.start, start);
        assert_eq!(window.end, at(2025, 6, 1));
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(129_900), "1299.00");
        assert_eq!(format_rupees(5), "0.05");
        assert_eq!(format_rupees(0), "0.00");
        assert_eq!(format_rupees(-250), "-2.50");
    }
}
