use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three bookable shifts of a working day. Being an enum, an undefined
/// shift is unrepresentable; request parsing rejects unknown strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
}

impl Shift {
    /// Wall-clock bounds of the shift.
    pub fn time_range(&self) -> (NaiveTime, NaiveTime) {
        match self {
            Shift::Morning => (
                NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
                NaiveTime::from_hms_opt(13, 0, 0).unwrap_or(NaiveTime::MIN),
            ),
            Shift::Afternoon => (
                NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            ),
            Shift::Evening => (
                NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
                NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN),
            ),
        }
    }

    pub fn start_time(&self) -> NaiveTime {
        self.time_range().0
    }

    pub fn end_time(&self) -> NaiveTime {
        self.time_range().1
    }

    /// True when the shift's end on `date` is already behind `now`.
    pub fn has_ended(&self, date: NaiveDate, now: NaiveDateTime) -> bool {
        let end = date.and_time(self.end_time());
        now >= end
    }
}

/// Shift bounds are Cairo wall-clock times (UTC+2, Egypt standard time).
pub const CLINIC_UTC_OFFSET_HOURS: i64 = 2;

/// Convert an instant to the clinic's wall clock before comparing it against
/// shift bounds; the server itself may run in any timezone.
pub fn clinic_time(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.naive_utc() + Duration::hours(CLINIC_UTC_OFFSET_HOURS)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: String,
    pub shift: Shift,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn weekday(&self) -> Option<Weekday> {
        parse_weekday(&self.day_of_week)
    }
}

/// Accepts full English day names, matching how rows are stored.
pub fn parse_weekday(value: &str) -> Option<Weekday> {
    match value.to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub doctor_id: Uuid,
    pub day_of_week: String,
    pub shift: Shift,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub day_of_week: Option<String>,
    pub shift: Option<Shift>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Schedule not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor already has a {shift:?} schedule on {day}")]
    DuplicateSchedule { day: String, shift: Shift },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ScheduleError {
    fn from(err: anyhow::Error) -> Self {
        ScheduleError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn shift_ranges_match_the_clinic_day() {
        assert_eq!(
            Shift::Morning.time_range(),
            (
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(13, 0, 0).unwrap()
            )
        );
        assert_eq!(
            Shift::Afternoon.time_range(),
            (
                NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap()
            )
        );
        assert_eq!(
            Shift::Evening.time_range(),
            (
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(21, 0, 0).unwrap()
            )
        );
    }

    #[test]
    fn has_ended_is_false_before_the_shift_end() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let now = date.and_hms_opt(12, 59, 59).unwrap();
        assert!(!Shift::Morning.has_ended(date, now));
    }

    #[test]
    fn has_ended_is_true_at_the_shift_end() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let now = date.and_hms_opt(13, 0, 0).unwrap();
        assert!(Shift::Morning.has_ended(date, now));
    }

    #[test]
    fn has_ended_is_true_on_a_later_day() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert!(Shift::Evening.has_ended(date, now));
    }

    #[test]
    fn clinic_time_applies_the_cairo_offset() {
        use chrono::TimeZone;

        let instant = Utc.with_ymd_and_hms(2025, 6, 10, 22, 30, 0).unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 6, 11)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        assert_eq!(clinic_time(instant), expected);
    }

    #[test]
    fn a_morning_shift_is_over_at_half_past_one_cairo_time() {
        use chrono::TimeZone;

        // 11:30 UTC is 13:30 in Cairo, past the morning shift's end.
        let instant = Utc.with_ymd_and_hms(2025, 6, 10, 11, 30, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert!(Shift::Morning.has_ended(date, clinic_time(instant)));
        assert!(!Shift::Evening.has_ended(date, clinic_time(instant)));
    }

    #[test]
    fn weekday_parsing_is_case_insensitive() {
        assert_eq!(parse_weekday("Monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("sunday"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("someday"), None);
    }

    #[test]
    fn shift_serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&Shift::Morning).unwrap(), "\"morning\"");
        let parsed: Shift = serde_json::from_str("\"evening\"").unwrap();
        assert_eq!(parsed, Shift::Evening);
    }
}
