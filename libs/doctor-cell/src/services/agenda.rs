use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentWithPatient, DoctorError, PatientSummary};

/// Day-level appointment listings for a doctor, joined with patient details.
pub struct DoctorAgendaService {
    supabase: SupabaseClient,
}

impl DoctorAgendaService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn appointments_today(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<AppointmentWithPatient>, DoctorError> {
        let today = Utc::now().date_naive();
        self.load_for_date(doctor_id, today, auth_token).await
    }

    pub async fn appointments_on_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AppointmentWithPatient>, DoctorError> {
        if date < Utc::now().date_naive() {
            return Err(DoctorError::Validation(
                "The provided date cannot be in the past".to_string(),
            ));
        }
        self.load_for_date(doctor_id, date, auth_token).await
    }

    async fn load_for_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AppointmentWithPatient>, DoctorError> {
        debug!("Fetching appointments for doctor {} on {}", doctor_id, date);

        let doctor_path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        let doctors: Vec<Value> = self
            .supabase
            .request(Method::GET, &doctor_path, Some(auth_token), None)
            .await?;
        if doctors.is_empty() {
            return Err(DoctorError::NotFound);
        }

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&order=shift.asc",
            doctor_id,
            date.format("%Y-%m-%d")
        );
        let appointments: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if appointments.is_empty() {
            return Ok(vec![]);
        }

        let patient_ids: Vec<String> = appointments
            .iter()
            .filter_map(|a| a["patient_id"].as_str().map(String::from))
            .collect();

        let patients_path = format!(
            "/rest/v1/patients?id=in.({})&select=id,full_name,email,phone_number",
            patient_ids.join(",")
        );
        let patients: Vec<PatientSummary> = self
            .supabase
            .request(Method::GET, &patients_path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        let mut result = Vec::with_capacity(appointments.len());
        for row in appointments {
            let patient = row["patient_id"]
                .as_str()
                .and_then(|pid| Uuid::parse_str(pid).ok())
                .and_then(|pid| patients.iter().find(|p| p.id == pid).cloned());

            let id = row["id"]
                .as_str()
                .and_then(|v| Uuid::parse_str(v).ok())
                .ok_or_else(|| DoctorError::Database("Malformed appointment row".to_string()))?;
            let date = row["date"]
                .as_str()
                .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
                .ok_or_else(|| DoctorError::Database("Malformed appointment row".to_string()))?;

            result.push(AppointmentWithPatient {
                id,
                date,
                shift: row["shift"].as_str().unwrap_or_default().to_string(),
                status: row["status"].as_str().unwrap_or_default().to_string(),
                patient,
            });
        }

        Ok(result)
    }
}
