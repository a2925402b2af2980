//! Daily run slots
//!
//! The daemon wakes at fixed wall-clock times (03:00 and 08:00 local by
//! default) and runs one cycle per slot.

use chrono::{DateTime, Days, LocalResult, NaiveTime, TimeZone};

use crate::error::GoldError;

/// Default daily slots, local time
pub const DEFAULT_SLOTS: &[&str] = &["03:00", "08:00"];

/// Parse an `HH:MM` slot
pub fn parse_slot(text: &str) -> Result<NaiveTime, GoldError> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|e| GoldError::Config(format!("invalid schedule slot {:?}: {}", text, e)))
}

/// Next slot strictly after `now`.
///
/// Looks at today's slots first, then tomorrow's. Local times that do not
/// exist (DST gaps) are skipped; ambiguous ones resolve to the earlier
/// instant. Returns `None` only when `slots` is empty.
pub fn next_run<Tz: TimeZone>(now: &DateTime<Tz>, slots: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let mut sorted = slots.to_vec();
    sorted.sort();
    sorted.dedup();

    let tz = now.timezone();
    let today = now.date_naive();

    // Today plus two more days, so a DST gap cannot hide every slot.
    for offset in 0..3u64 {
        let day = today.checked_add_days(Days::new(offset))?;
        for slot in &sorted {
            let candidate = match tz.from_local_datetime(&day.and_time(*slot)) {
                LocalResult::Single(t) => t,
                LocalResult::Ambiguous(earliest, _) => earliest,
                LocalResult::None => continue,
            };
            if candidate > *now {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn slots() -> Vec<NaiveTime> {
        DEFAULT_SLOTS.iter().map(|s| parse_slot(s).unwrap()).collect()
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_before_first_slot_runs_this_morning() {
        assert_eq!(next_run(&utc(1, 30), &slots()), Some(utc(3, 0)));
    }

    #[test]
    fn test_between_slots_runs_this_afternoon() {
        assert_eq!(next_run(&utc(5, 0), &slots()), Some(utc(8, 0)));
    }

    #[test]
    fn test_after_last_slot_runs_tomorrow() {
        assert_eq!(
            next_run(&utc(9, 0), &slots()),
            Some(Utc.with_ymd_and_hms(2025, 3, 2, 3, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_exactly_on_slot_moves_to_next() {
        assert_eq!(next_run(&utc(3, 0), &slots()), Some(utc(8, 0)));
    }

    #[test]
    fn test_unsorted_slots() {
        let unsorted = vec![parse_slot("08:00").unwrap(), parse_slot("03:00").unwrap()];
        assert_eq!(next_run(&utc(0, 0), &unsorted), Some(utc(3, 0)));
    }

    #[test]
    fn test_no_slots() {
        assert_eq!(next_run(&utc(0, 0), &[]), None);
    }

    #[test]
    fn test_parse_slot_rejects_garbage() {
        assert!(parse_slot("25:00").is_err());
        assert!(parse_slot("morning").is_err());
        assert_eq!(parse_slot(" 07:45 ").unwrap(), NaiveTime::from_hms_opt(7, 45, 0).unwrap());
    }
}
