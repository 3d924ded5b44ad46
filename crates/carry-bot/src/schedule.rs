//! Funding trigger schedule.
//!
//! Funding settles at fixed UTC boundaries: every `reset_every_hours`
//! from midnight. A cycle fires a configured lead time before each
//! boundary so entries are live when the payment lands.

use chrono::{DateTime, Duration, Utc};

/// The next trigger instant strictly after `now`.
///
/// Triggers sit at `k * reset_every_hours` into each UTC day, minus
/// the lead; day wrap falls out of walking forward from the current
/// day's midnight.
pub fn next_trigger_after(
    now: DateTime<Utc>,
    reset_every_hours: u32,
    lead: Duration,
) -> DateTime<Utc> {
    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc();
    let cadence = Duration::hours(i64::from(reset_every_hours));

    let mut candidate = day_start - lead;
    while candidate <= now {
        candidate += cadence;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_next_trigger_before_upcoming_reset() {
        // 07:59:00 with 8h cadence and 15s lead: next reset is 08:00,
        // so the trigger is 07:59:45.
        let next = next_trigger_after(utc(2024, 1, 1, 7, 59, 0), 8, Duration::seconds(15));
        assert_eq!(next, utc(2024, 1, 1, 7, 59, 45));
    }

    #[test]
    fn test_trigger_already_passed_moves_to_next_reset() {
        // At 07:59:50 the 08:00 trigger (07:59:45) is gone; the next
        // one belongs to the 16:00 reset.
        let next = next_trigger_after(utc(2024, 1, 1, 7, 59, 50), 8, Duration::seconds(15));
        assert_eq!(next, utc(2024, 1, 1, 15, 59, 45));
    }

    #[test]
    fn test_day_wrap() {
        // Past the midnight trigger: the next one is tomorrow 08:00
        // minus lead.
        let next = next_trigger_after(utc(2024, 1, 1, 23, 59, 50), 8, Duration::seconds(15));
        assert_eq!(next, utc(2024, 1, 2, 7, 59, 45));
    }

    #[test]
    fn test_exactly_at_trigger_is_strict() {
        let at_trigger = utc(2024, 1, 1, 7, 59, 45);
        let next = next_trigger_after(at_trigger, 8, Duration::seconds(15));
        assert_eq!(next, utc(2024, 1, 1, 15, 59, 45));
    }

    #[test]
    fn test_daily_cadence() {
        let next = next_trigger_after(utc(2024, 1, 1, 12, 0, 0), 24, Duration::seconds(30));
        assert_eq!(next, utc(2024, 1, 1, 23, 59, 30));
    }

    #[test]
    fn test_long_lead() {
        // One hour of lead before the 16:00 reset.
        let next = next_trigger_after(utc(2024, 1, 1, 9, 0, 0), 8, Duration::hours(1));
        assert_eq!(next, utc(2024, 1, 1, 15, 0, 0));
    }

    #[test]
    fn test_trigger_is_always_in_the_future() {
        let now = utc(2024, 6, 15, 3, 17, 29);
        for cadence in [1, 4, 8, 12, 24] {
            let next = next_trigger_after(now, cadence, Duration::seconds(15));
            assert!(next > now, "cadence {cadence}h produced {next}");
        }
    }
}
