use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use notification_cell::EmailService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::booking::representation_headers;

pub struct AppointmentLifecycleService {
    supabase: SupabaseClient,
    config: AppConfig,
}

impl AppointmentLifecycleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    async fn load(&self, appointment_id: &str, auth_token: &str) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row).map_err(|e| AppointmentError::Database(e.to_string()))
    }

    async fn set_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let update = json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update),
                Some(representation_headers()),
            )
            .await?;

        let row = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row).map_err(|e| AppointmentError::Database(e.to_string()))
    }

    /// Only a Confirmed appointment can be completed; terminal states stay put.
    pub async fn mark_completed(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id, auth_token).await?;

        if !appointment.status.can_transition_to(AppointmentStatus::Completed) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Completed,
            });
        }

        info!("Marking appointment {} as completed", appointment.id);
        self.set_status(appointment.id, AppointmentStatus::Completed, auth_token)
            .await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id, auth_token).await?;

        if !appointment.status.can_transition_to(AppointmentStatus::Cancelled) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Cancelled,
            });
        }

        info!("Cancelling appointment {}", appointment.id);
        self.set_status(appointment.id, AppointmentStatus::Cancelled, auth_token)
            .await
    }

    /// Cancels every non-cancelled appointment the doctor has on `date` and
    /// notifies each affected patient. Notification failures are logged and
    /// swallowed; the cancellations stand regardless. Returns the number of
    /// appointments cancelled, so a second run returns zero.
    pub async fn cancel_for_doctor_on_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<usize, AppointmentError> {
        info!("Cancelling appointments for doctor {} on {}", doctor_id, date);

        let doctor_path = format!("/rest/v1/doctors?id=eq.{}&select=id,full_name", doctor_id);
        let doctors: Vec<Value> = self
            .supabase
            .request(Method::GET, &doctor_path, Some(auth_token), None)
            .await?;
        let doctor = doctors.into_iter().next().ok_or(AppointmentError::DoctorNotFound)?;
        let doctor_name = doctor["full_name"].as_str().unwrap_or("your doctor").to_string();

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&status=neq.cancelled",
            doctor_id,
            date.format("%Y-%m-%d")
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let appointments: Vec<Appointment> = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| AppointmentError::Database(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        if appointments.is_empty() {
            return Ok(0);
        }

        let update = json!({
            "status": "cancelled",
            "updated_at": Utc::now().to_rfc3339()
        });
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update),
                Some(representation_headers()),
            )
            .await?;

        let cancelled = appointments.len();
        info!("Cancelled {} appointments for doctor {}", cancelled, doctor_id);

        self.notify_patients(&appointments, &doctor_name, date, auth_token)
            .await;

        Ok(cancelled)
    }

    async fn notify_patients(
        &self,
        appointments: &[Appointment],
        doctor_name: &str,
        date: NaiveDate,
        auth_token: &str,
    ) {
        let email = match EmailService::new(&self.config) {
            Ok(email) => email,
            Err(e) => {
                warn!("Email service unavailable, skipping cancellation notices: {}", e);
                return;
            }
        };

        let patient_ids: Vec<String> = appointments
            .iter()
            .map(|a| a.patient_id.to_string())
            .collect();
        let patients_path = format!(
            "/rest/v1/patients?id=in.({})&select=id,full_name,email",
            patient_ids.join(",")
        );
        let patients: Vec<Value> = match self
            .supabase
            .request(Method::GET, &patients_path, Some(auth_token), None)
            .await
        {
            Ok(patients) => patients,
            Err(e) => {
                error!("Failed to load patients for cancellation notices: {}", e);
                return;
            }
        };

        let date_text = date.format("%Y-%m-%d").to_string();
        for patient in patients {
            let to = patient["email"].as_str().unwrap_or_default();
            let name = patient["full_name"].as_str().unwrap_or("patient");
            if to.is_empty() {
                continue;
            }
            if let Err(e) = email
                .send_cancellation_email(to, name, doctor_name, &date_text)
                .await
            {
                error!("Failed to send cancellation email to {}: {}", to, e);
            }
        }
    }
}
