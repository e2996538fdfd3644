use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A resolved, day-aligned reporting window. `start` is the first instant
/// of the first day and `end` the last instant of the last day, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Number of calendar days covered by the window.
    pub fn num_days(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }

    /// The immediately preceding window of identical length, ending the
    /// day before this one starts.
    pub fn previous(&self) -> ReportRange {
        let days = self.num_days();
        let prev_end = self.start.date_naive() - Duration::days(1);
        let prev_start = prev_end - Duration::days(days - 1);
        ReportRange {
            start: start_of_day(prev_start),
            end: end_of_day(prev_end),
        }
    }

    /// Iterate the calendar days of the window in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start.date_naive();
        let count = self.num_days();
        (0..count).map(move |offset| start + Duration::days(offset))
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc()
}

fn trailing_days(now: DateTime<Utc>, days: i64) -> ReportRange {
    let today = now.date_naive();
    ReportRange {
        start: start_of_day(today - Duration::days(days - 1)),
        end: end_of_day(today),
    }
}

/// Resolve a preset token or explicit `from`/`to` dates into a window.
///
/// Presets: `last_7`, `last_30`, `last_90` (trailing, anchored at `now`)
/// and `ytd` (Jan 1 through today). Anything else falls back to the
/// explicit dates (`YYYY-MM-DD`, both required and ordered), and failing
/// that to a trailing 30-day window. There is deliberately no error path:
/// unparseable input silently defaults.
pub fn resolve_range(
    preset: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> ReportRange {
    match preset.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
        Some("last_7") => trailing_days(now, 7),
        Some("last_30") => trailing_days(now, 30),
        Some("last_90") => trailing_days(now, 90),
        Some("ytd") => {
            let jan_first = NaiveDate::from_ymd_opt(now.year(), 1, 1).unwrap();
            ReportRange {
                start: start_of_day(jan_first),
                end: end_of_day(now.date_naive()),
            }
        }
        _ => explicit_or_default(from, to, now),
    }
}

fn explicit_or_default(
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> ReportRange {
    let parsed_from = from.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
    let parsed_to = to.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

    match (parsed_from, parsed_to) {
        (Some(from), Some(to)) if from <= to => ReportRange {
            start: start_of_day(from),
            end: end_of_day(to),
        },
        _ => trailing_days(now, 30),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn last_7_covers_seven_days_ending_today() {
        let range = resolve_range(Some("last_7"), None, None, noon(2026, 3, 15));
        assert_eq!(range.num_days(), 7);
        assert_eq!(range.start.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(range.end.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert_eq!(range.start.time(), chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn presets_are_case_insensitive() {
        let range = resolve_range(Some("  LAST_30 "), None, None, noon(2026, 3, 15));
        assert_eq!(range.num_days(), 30);
    }

    #[test]
    fn ytd_starts_january_first() {
        let range = resolve_range(Some("ytd"), None, None, noon(2026, 3, 15));
        assert_eq!(range.start.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(range.end.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn explicit_dates_win_without_preset() {
        let range = resolve_range(None, Some("2026-02-01"), Some("2026-02-10"), noon(2026, 3, 15));
        assert_eq!(range.num_days(), 10);
        assert_eq!(range.start.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    }

    #[test]
    fn unknown_preset_falls_back_to_explicit_dates() {
        let range = resolve_range(
            Some("custom"),
            Some("2026-02-01"),
            Some("2026-02-03"),
            noon(2026, 3, 15),
        );
        assert_eq!(range.num_days(), 3);
    }

    #[test]
    fn garbage_input_silently_defaults_to_trailing_30() {
        let now = noon(2026, 3, 15);
        for (from, to) in [
            (None, None),
            (Some("not-a-date"), Some("2026-02-10")),
            (Some("2026-02-10"), None),
            (Some("2026-02-10"), Some("2026-02-01")), // reversed
        ] {
            let range = resolve_range(None, from, to, now);
            assert_eq!(range.num_days(), 30, "from={from:?} to={to:?}");
            assert_eq!(range.end.date_naive(), now.date_naive());
        }
    }

    #[test]
    fn previous_window_is_adjacent_and_equal_length() {
        let range = resolve_range(Some("last_7"), None, None, noon(2026, 3, 15));
        let prev = range.previous();

        assert_eq!(prev.num_days(), 7);
        assert_eq!(
            prev.end.date_naive(),
            range.start.date_naive() - Duration::days(1)
        );
        assert!(!prev.contains(range.start));
        assert!(prev.contains(prev.end));
    }

    #[test]
    fn days_iterates_every_calendar_day() {
        let range = resolve_range(None, Some("2026-02-27"), Some("2026-03-02"), noon(2026, 3, 15));
        let days: Vec<NaiveDate> = range.days().collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
                NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            ]
        );
    }
}
