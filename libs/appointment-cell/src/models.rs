use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schedule_cell::models::Shift;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Completed and Cancelled are terminal.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Paymob,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub branch_id: Uuid,
    pub date: NaiveDate,
    pub shift: Shift,
    pub status: AppointmentStatus,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub branch_id: Uuid,
    pub date: NaiveDate,
    pub shift: Shift,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Branch not found")]
    BranchNotFound,

    #[error("Cannot book an appointment on a past date")]
    DateInPast,

    #[error("The {0:?} shift has already ended today")]
    ShiftElapsed(Shift),

    #[error("Patient already has an appointment with this doctor for this date and shift")]
    DuplicateBooking,

    #[error("Cannot transition appointment from {from:?} to {to:?}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::Database(err.to_string())
    }
}

/// Booking-time guard: no past dates, and no same-day shift whose end has
/// already passed.
pub fn validate_booking_time(
    date: NaiveDate,
    shift: Shift,
    now: NaiveDateTime,
) -> Result<(), AppointmentError> {
    if date < now.date() {
        return Err(AppointmentError::DateInPast);
    }
    if date == now.date() && shift.has_ended(date, now) {
        return Err(AppointmentError::ShiftElapsed(shift));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn past_dates_are_rejected() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();

        let result = validate_booking_time(yesterday, Shift::Morning, now);
        assert!(matches!(result, Err(AppointmentError::DateInPast)));
    }

    #[test]
    fn an_elapsed_shift_today_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let now = today.and_hms_opt(13, 30, 0).unwrap();

        let result = validate_booking_time(today, Shift::Morning, now);
        assert!(matches!(result, Err(AppointmentError::ShiftElapsed(_))));
    }

    #[test]
    fn a_later_shift_today_is_accepted() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let now = today.and_hms_opt(13, 30, 0).unwrap();

        assert!(validate_booking_time(today, Shift::Evening, now).is_ok());
    }

    #[test]
    fn a_future_date_is_accepted_for_any_shift() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();

        assert!(validate_booking_time(tomorrow, Shift::Morning, now).is_ok());
    }

    #[test]
    fn confirmed_can_complete_or_cancel() {
        assert!(AppointmentStatus::Confirmed.can_transition_to(AppointmentStatus::Completed));
        assert!(AppointmentStatus::Confirmed.can_transition_to(AppointmentStatus::Cancelled));
    }

    #[test]
    fn terminal_states_allow_no_transitions() {
        assert!(AppointmentStatus::Completed.valid_transitions().is_empty());
        assert!(AppointmentStatus::Cancelled.valid_transitions().is_empty());
        assert!(!AppointmentStatus::Cancelled.can_transition_to(AppointmentStatus::Confirmed));
    }
}
