use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    parse_weekday, CreateScheduleRequest, Schedule, ScheduleError, Shift, UpdateScheduleRequest,
};

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

/// Shift equality over the doctor's schedules for one day. Shifts are discrete
/// buckets, so two schedules conflict exactly when day and shift both match.
pub fn schedule_conflicts(
    existing: &[Schedule],
    day_of_week: &str,
    shift: Shift,
    exclude: Option<Uuid>,
) -> bool {
    existing.iter().any(|s| {
        exclude != Some(s.id)
            && s.day_of_week.eq_ignore_ascii_case(day_of_week)
            && s.shift == shift
    })
}

pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn doctor_exists(&self, doctor_id: Uuid, auth_token: &str) -> Result<bool, ScheduleError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn schedules_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Schedule>, ScheduleError> {
        let path = format!("/rest/v1/schedules?doctor_id=eq.{}", doctor_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| ScheduleError::Database(e.to_string())))
            .collect()
    }

    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        debug!(
            "Creating schedule for doctor {} on {} ({:?})",
            request.doctor_id, request.day_of_week, request.shift
        );

        if parse_weekday(&request.day_of_week).is_none() {
            return Err(ScheduleError::Validation(format!(
                "Unknown day of week: {}",
                request.day_of_week
            )));
        }

        if !self.doctor_exists(request.doctor_id, auth_token).await? {
            return Err(ScheduleError::DoctorNotFound);
        }

        let existing = self.schedules_for_doctor(request.doctor_id, auth_token).await?;
        if schedule_conflicts(&existing, &request.day_of_week, request.shift, None) {
            warn!(
                "Duplicate schedule for doctor {} on {} ({:?})",
                request.doctor_id, request.day_of_week, request.shift
            );
            return Err(ScheduleError::DuplicateSchedule {
                day: request.day_of_week,
                shift: request.shift,
            });
        }

        let (start, end) = request.shift.time_range();
        let data = json!({
            "doctor_id": request.doctor_id,
            "day_of_week": request.day_of_week,
            "shift": request.shift,
            "start_time": start.format("%H:%M:%S").to_string(),
            "end_time": end.format("%H:%M:%S").to_string(),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/schedules",
                Some(auth_token),
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Database("Failed to create schedule".to_string()))?;

        serde_json::from_value(row).map_err(|e| ScheduleError::Database(e.to_string()))
    }

    pub async fn get_schedule(
        &self,
        schedule_id: &str,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        let path = format!("/rest/v1/schedules?id=eq.{}", schedule_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result.into_iter().next().ok_or(ScheduleError::NotFound)?;
        serde_json::from_value(row).map_err(|e| ScheduleError::Database(e.to_string()))
    }

    pub async fn list_schedules(&self, auth_token: &str) -> Result<Vec<Schedule>, ScheduleError> {
        let rows: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/schedules?order=day_of_week.asc",
                Some(auth_token),
                None,
            )
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| ScheduleError::Database(e.to_string())))
            .collect()
    }

    pub async fn list_by_day(
        &self,
        day_of_week: &str,
        auth_token: &str,
    ) -> Result<Vec<Schedule>, ScheduleError> {
        if parse_weekday(day_of_week).is_none() {
            return Err(ScheduleError::Validation(format!(
                "Unknown day of week: {}",
                day_of_week
            )));
        }

        let path = format!("/rest/v1/schedules?day_of_week=ilike.{}", day_of_week);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| ScheduleError::Database(e.to_string())))
            .collect()
    }

    pub async fn list_by_day_and_shift(
        &self,
        day_of_week: &str,
        shift: Shift,
        auth_token: &str,
    ) -> Result<Vec<Schedule>, ScheduleError> {
        let schedules = self.list_by_day(day_of_week, auth_token).await?;
        Ok(schedules.into_iter().filter(|s| s.shift == shift).collect())
    }

    pub async fn list_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Schedule>, ScheduleError> {
        let doctor_id = Uuid::parse_str(doctor_id)
            .map_err(|_| ScheduleError::Validation("Invalid doctor ID".to_string()))?;

        if !self.doctor_exists(doctor_id, auth_token).await? {
            return Err(ScheduleError::DoctorNotFound);
        }

        self.schedules_for_doctor(doctor_id, auth_token).await
    }

    pub async fn update_schedule(
        &self,
        schedule_id: &str,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        debug!("Updating schedule {}", schedule_id);

        let current = self.get_schedule(schedule_id, auth_token).await?;

        let day_of_week = request.day_of_week.unwrap_or(current.day_of_week.clone());
        if parse_weekday(&day_of_week).is_none() {
            return Err(ScheduleError::Validation(format!(
                "Unknown day of week: {}",
                day_of_week
            )));
        }
        let shift = request.shift.unwrap_or(current.shift);

        // Conflict check excludes the schedule being updated.
        let existing = self.schedules_for_doctor(current.doctor_id, auth_token).await?;
        if schedule_conflicts(&existing, &day_of_week, shift, Some(current.id)) {
            return Err(ScheduleError::DuplicateSchedule {
                day: day_of_week,
                shift,
            });
        }

        let (start, end) = shift.time_range();
        let update_data = json!({
            "day_of_week": day_of_week,
            "shift": shift,
            "start_time": start.format("%H:%M:%S").to_string(),
            "end_time": end.format("%H:%M:%S").to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/schedules?id=eq.{}", schedule_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await?;

        let row = result.into_iter().next().ok_or(ScheduleError::NotFound)?;
        serde_json::from_value(row).map_err(|e| ScheduleError::Database(e.to_string()))
    }

    pub async fn delete_schedule(
        &self,
        schedule_id: &str,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        self.get_schedule(schedule_id, auth_token).await?;

        let path = format!("/rest/v1/schedules?id=eq.{}", schedule_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn schedule(day: &str, shift: Shift) -> Schedule {
        let (start_time, end_time) = shift.time_range();
        Schedule {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            day_of_week: day.to_string(),
            shift,
            start_time,
            end_time,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn same_day_and_shift_conflict() {
        let existing = vec![schedule("Monday", Shift::Morning)];
        assert!(schedule_conflicts(&existing, "Monday", Shift::Morning, None));
    }

    #[test]
    fn day_comparison_ignores_case() {
        let existing = vec![schedule("Monday", Shift::Morning)];
        assert!(schedule_conflicts(&existing, "monday", Shift::Morning, None));
    }

    #[test]
    fn different_shift_on_the_same_day_does_not_conflict() {
        let existing = vec![schedule("Monday", Shift::Morning)];
        assert!(!schedule_conflicts(&existing, "Monday", Shift::Evening, None));
    }

    #[test]
    fn same_shift_on_another_day_does_not_conflict() {
        let existing = vec![schedule("Monday", Shift::Morning)];
        assert!(!schedule_conflicts(&existing, "Tuesday", Shift::Morning, None));
    }

    #[test]
    fn update_excludes_the_record_being_modified() {
        let existing = vec![schedule("Monday", Shift::Morning)];
        let own_id = existing[0].id;
        assert!(!schedule_conflicts(
            &existing,
            "Monday",
            Shift::Morning,
            Some(own_id)
        ));
        assert!(schedule_conflicts(
            &existing,
            "Monday",
            Shift::Morning,
            Some(Uuid::new_v4())
        ));
    }
}
