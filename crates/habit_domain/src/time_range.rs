//! Converts a habit's local start/end times into absolute UTC instants for
//! the day after the reference date.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::habit::HabitDefinition;

/// Absolute bounds of one habit occurrence. `end` is always after `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn start_iso(&self) -> String {
        to_iso_millis(self.start)
    }

    pub fn end_iso(&self) -> String {
        to_iso_millis(self.end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Explicit inputs for callers that already resolved the habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRangeParams {
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    /// Reference instant; the range is computed for the following day. Defaults to now.
    pub date: Option<DateTime<Utc>>,
}

pub fn calculate_time_range(
    habit: &HabitDefinition,
    timezone: &str,
    reference: DateTime<Utc>,
) -> Result<TimeRange, ScheduleError> {
    calculate_time_range_from_params(&TimeRangeParams {
        start_time: habit.start_time.clone(),
        end_time: habit.end_time.clone(),
        timezone: timezone.to_string(),
        date: Some(reference),
    })
}

pub fn calculate_time_range_from_params(
    params: &TimeRangeParams,
) -> Result<TimeRange, ScheduleError> {
    let start_time = parse_time_of_day(&params.start_time)?;
    let end_time = parse_time_of_day(&params.end_time)?;
    let tz = parse_timezone(&params.timezone)?;
    let reference = params.date.unwrap_or_else(Utc::now);

    let target = reference
        .with_timezone(&tz)
        .date_naive()
        .succ_opt()
        .ok_or(ScheduleError::DateOutOfRange)?;
    range_on_date(target, start_time, end_time, tz)
}

/// Builds the range for a calendar date in `tz`. The window crosses midnight
/// when the configured end time is not after the start time; `end` then lands
/// on the next calendar day.
pub fn range_on_date(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    tz: Tz,
) -> Result<TimeRange, ScheduleError> {
    let start_local = date.and_time(start_time);
    let end_date = if end_time <= start_time {
        date.succ_opt().ok_or(ScheduleError::DateOutOfRange)?
    } else {
        date
    };
    let end_local = end_date.and_time(end_time);

    let start = local_to_utc(start_local, tz);
    let mut end = local_to_utc(end_local, tz);
    // A DST gap can push `start` past `end`; keep the configured wall-clock length.
    if end <= start {
        end = start + (end_local - start_local);
    }
    Ok(TimeRange { start, end })
}

/// Resolves a wall-clock time in `tz` to UTC, using the offset in force on
/// that date. Ambiguous times take the earlier instant; times skipped by a DST
/// gap are shifted by the offset looked up at the same wall-clock reading in UTC.
fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) | LocalResult::Ambiguous(local, _) => local.with_timezone(&Utc),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&naive).fix().local_minus_utc();
            Utc.from_utc_datetime(&(naive - Duration::seconds(i64::from(offset))))
        }
    }
}

/// Parses `H:MM` or `HH:MM` with hours 0-23 and minutes 0-59.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidTimeFormat(raw.to_string());
    let (hours, minutes) = raw.split_once(':').ok_or_else(invalid)?;
    let well_formed = (1..=2).contains(&hours.len())
        && minutes.len() == 2
        && hours.bytes().all(|b| b.is_ascii_digit())
        && minutes.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

pub fn is_valid_time_format(raw: &str) -> bool {
    parse_time_of_day(raw).is_ok()
}

pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

pub fn is_valid_timezone(name: &str) -> bool {
    parse_timezone(name).is_ok()
}

/// Current wall-clock time in `timezone` as `HH:MM`. Diagnostics only.
pub fn current_time_in_timezone(timezone: &str) -> Result<String, ScheduleError> {
    current_time_in_timezone_at(Utc::now(), timezone)
}

pub fn current_time_in_timezone_at(
    now: DateTime<Utc>,
    timezone: &str,
) -> Result<String, ScheduleError> {
    let tz = parse_timezone(timezone)?;
    Ok(format_hh_mm(now.with_timezone(&tz).time()))
}

/// Renders a range as local `HH:MM - HH:MM` for logs.
pub fn format_time_range_for_display(
    range: &TimeRange,
    timezone: &str,
) -> Result<String, ScheduleError> {
    let tz = parse_timezone(timezone)?;
    let start = range.start.with_timezone(&tz).time();
    let end = range.end.with_timezone(&tz).time();
    Ok(format!("{} - {}", format_hh_mm(start), format_hh_mm(end)))
}

fn format_hh_mm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub fn to_iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso_millis(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn params(start: &str, end: &str, tz: &str, date: DateTime<Utc>) -> TimeRangeParams {
        TimeRangeParams {
            start_time: start.into(),
            end_time: end.into(),
            timezone: tz.into(),
            date: Some(date),
        }
    }

    #[test]
    fn same_day_range_in_utc() {
        let range =
            calculate_time_range_from_params(&params("07:00", "08:00", "UTC", reference(2024, 1, 15)))
                .unwrap();
        assert_eq!(range.start_iso(), "2024-01-16T07:00:00.000Z");
        assert_eq!(range.end_iso(), "2024-01-16T08:00:00.000Z");
    }

    #[test]
    fn midnight_crossing_rolls_end_to_next_day() {
        let range =
            calculate_time_range_from_params(&params("23:30", "01:00", "UTC", reference(2024, 1, 15)))
                .unwrap();
        assert_eq!(range.start_iso(), "2024-01-16T23:30:00.000Z");
        assert_eq!(range.end_iso(), "2024-01-17T01:00:00.000Z");
    }

    #[test]
    fn equal_times_span_a_full_day() {
        let range =
            calculate_time_range_from_params(&params("06:00", "06:00", "UTC", reference(2024, 1, 15)))
                .unwrap();
        assert_eq!(range.duration(), Duration::hours(24));
    }

    #[test]
    fn rejects_out_of_range_hours() {
        let err =
            calculate_time_range_from_params(&params("25:00", "08:00", "UTC", reference(2024, 1, 15)))
                .unwrap_err();
        assert_eq!(err, ScheduleError::InvalidTimeFormat("25:00".into()));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = calculate_time_range_from_params(&params(
            "07:00",
            "08:00",
            "Mars/Olympus_Mons",
            reference(2024, 1, 15),
        ))
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTimezone(_)));
    }

    #[test]
    fn time_format_validation() {
        for ok in ["0:00", "7:05", "07:05", "23:59", "00:00"] {
            assert!(is_valid_time_format(ok), "{ok}");
        }
        for bad in ["24:00", "12:60", "7:5", "007:00", "12-30", "", "ab:cd", "+1:00", "12:3 "] {
            assert!(!is_valid_time_format(bad), "{bad}");
        }
    }

    #[test]
    fn tokyo_rolls_over_at_local_midnight() {
        // 2024-01-15T16:00Z is already 01:00 on the 16th in Tokyo, so tomorrow is the 17th.
        let reference = Utc.with_ymd_and_hms(2024, 1, 15, 16, 0, 0).unwrap();
        let range =
            calculate_time_range_from_params(&params("07:00", "08:00", "Asia/Tokyo", reference))
                .unwrap();
        assert_eq!(range.start_iso(), "2024-01-16T22:00:00.000Z");
        assert_eq!(range.end_iso(), "2024-01-16T23:00:00.000Z");
    }

    #[test]
    fn offset_follows_daylight_saving_per_date() {
        let winter = calculate_time_range_from_params(&params(
            "09:00",
            "10:00",
            "America/New_York",
            reference(2024, 1, 15),
        ))
        .unwrap();
        let summer = calculate_time_range_from_params(&params(
            "09:00",
            "10:00",
            "America/New_York",
            reference(2024, 7, 15),
        ))
        .unwrap();
        assert_eq!(winter.start_iso(), "2024-01-16T14:00:00.000Z");
        assert_eq!(summer.start_iso(), "2024-07-16T13:00:00.000Z");
    }

    #[test]
    fn crossing_a_dst_change_keeps_calendar_dates() {
        // Clocks go forward at 02:00 on 2024-03-10 in New York.
        let range = calculate_time_range_from_params(&params(
            "23:00",
            "03:00",
            "America/New_York",
            Utc.with_ymd_and_hms(2024, 3, 8, 17, 0, 0).unwrap(),
        ))
        .unwrap();
        let tz: Tz = "America/New_York".parse().unwrap();
        let start_local = range.start.with_timezone(&tz);
        let end_local = range.end.with_timezone(&tz);
        assert_eq!(start_local.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(end_local.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(range.duration(), Duration::hours(3));
    }

    #[test]
    fn skipped_local_time_still_resolves() {
        // 02:30 does not exist on 2024-03-10 in New York.
        let range = calculate_time_range_from_params(&params(
            "02:30",
            "04:00",
            "America/New_York",
            Utc.with_ymd_and_hms(2024, 3, 9, 17, 0, 0).unwrap(),
        ))
        .unwrap();
        assert!(range.end > range.start);
    }

    #[test]
    fn window_starting_in_a_dst_gap_stays_on_its_day() {
        // 02:30 is skipped on 2024-03-10 in New York; 03:00 exists.
        let range = calculate_time_range_from_params(&params(
            "02:30",
            "03:00",
            "America/New_York",
            Utc.with_ymd_and_hms(2024, 3, 9, 17, 0, 0).unwrap(),
        ))
        .unwrap();
        let tz: Tz = "America/New_York".parse().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(range.start.with_timezone(&tz).date_naive(), day);
        assert_eq!(range.end.with_timezone(&tz).date_naive(), day);
        assert!(range.end > range.start);
        assert_eq!(range.duration(), Duration::minutes(30));
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let p = params("21:15", "22:45", "Europe/Berlin", reference(2024, 5, 2));
        let first = calculate_time_range_from_params(&p).unwrap();
        let second = calculate_time_range_from_params(&p).unwrap();
        assert_eq!(first.start_iso(), second.start_iso());
        assert_eq!(first.end_iso(), second.end_iso());
    }

    #[test]
    fn habit_variant_uses_habit_times() {
        let habit = HabitDefinition::new("Read", "tpl", &["tuesday"], "7:30", "8:00");
        let range = calculate_time_range(&habit, "UTC", reference(2024, 1, 15)).unwrap();
        assert_eq!(range.start_iso(), "2024-01-16T07:30:00.000Z");
    }

    #[test]
    fn display_and_current_time_helpers() {
        let range =
            calculate_time_range_from_params(&params("23:30", "01:00", "Asia/Tokyo", reference(2024, 1, 15)))
                .unwrap();
        assert_eq!(
            format_time_range_for_display(&range, "Asia/Tokyo").unwrap(),
            "23:30 - 01:00"
        );
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 23, 5, 42).unwrap();
        assert_eq!(current_time_in_timezone_at(now, "Asia/Tokyo").unwrap(), "08:05");
        assert!(current_time_in_timezone("Nowhere/City").is_err());
    }

    #[test]
    fn serializes_with_millisecond_precision() {
        let range =
            calculate_time_range_from_params(&params("07:00", "08:00", "UTC", reference(2024, 1, 15)))
                .unwrap();
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["start"], "2024-01-16T07:00:00.000Z");
        assert_eq!(json["end"], "2024-01-16T08:00:00.000Z");
    }
}
