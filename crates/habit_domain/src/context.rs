use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::ScheduleError;
use crate::time_range::parse_timezone;

/// Inputs shared by every habit in one scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub reference: DateTime<Utc>,
    pub timezone: Tz,
}

impl RunContext {
    /// Resolves `timezone` and pins the reference instant, defaulting to now.
    pub fn new(timezone: &str, reference: Option<DateTime<Utc>>) -> Result<Self, ScheduleError> {
        Ok(Self::at(reference.unwrap_or_else(Utc::now), parse_timezone(timezone)?))
    }

    pub fn at(reference: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            reference,
            timezone,
        }
    }

    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }

    /// Calendar date of the reference instant in the run timezone.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference.with_timezone(&self.timezone).date_naive()
    }

    /// The day entries are created for.
    pub fn target_date(&self) -> Option<NaiveDate> {
        self.reference_date().succ_opt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reference_date_is_local_to_the_timezone() {
        let reference = Utc.with_ymd_and_hms(2024, 1, 7, 20, 0, 0).unwrap();
        let tokyo = RunContext::new("Asia/Tokyo", Some(reference)).unwrap();
        assert_eq!(tokyo.reference_date(), NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(tokyo.target_date(), NaiveDate::from_ymd_opt(2024, 1, 9));

        let utc = RunContext::new("UTC", Some(reference)).unwrap();
        assert_eq!(utc.reference_date(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(utc.timezone_name(), "UTC");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert_eq!(
            RunContext::new("Not/AZone", None).unwrap_err(),
            ScheduleError::InvalidTimezone("Not/AZone".into())
        );
    }
}
