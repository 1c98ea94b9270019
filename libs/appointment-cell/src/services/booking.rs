use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use schedule_cell::models::clinic_time;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    validate_booking_time, Appointment, AppointmentError, BookAppointmentRequest, PaymentMethod,
};

pub(crate) fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

pub struct AppointmentBookingService {
    supabase: SupabaseClient,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn row_exists(
        &self,
        table: &str,
        id: Uuid,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let path = format!("/rest/v1/{}?id=eq.{}&select=id", table, id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!rows.is_empty())
    }

    /// Any appointment with the same (patient, doctor, date, shift) blocks a
    /// new booking, whatever its status.
    async fn duplicate_exists(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let shift = serde_json::to_value(request.shift)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default();
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&doctor_id=eq.{}&date=eq.{}&shift=eq.{}&select=id",
            request.patient_id,
            request.doctor_id,
            request.date.format("%Y-%m-%d"),
            shift
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking {:?} appointment for patient {} with doctor {} on {} ({:?})",
            request.payment_method, request.patient_id, request.doctor_id, request.date, request.shift
        );

        validate_booking_time(request.date, request.shift, clinic_time(Utc::now()))?;

        if !self.row_exists("patients", request.patient_id, auth_token).await? {
            return Err(AppointmentError::PatientNotFound);
        }
        if !self.row_exists("doctors", request.doctor_id, auth_token).await? {
            return Err(AppointmentError::DoctorNotFound);
        }
        if !self.row_exists("branches", request.branch_id, auth_token).await? {
            return Err(AppointmentError::BranchNotFound);
        }

        if self.duplicate_exists(&request, auth_token).await? {
            return Err(AppointmentError::DuplicateBooking);
        }

        match request.payment_method {
            PaymentMethod::Cash => self.book_cash(&request, auth_token).await,
            PaymentMethod::Paymob => self.book_paymob(&request, auth_token).await,
        }
    }

    /// Cash bookings run through a database function so the appointment and
    /// its pending payment commit in one transaction.
    async fn book_cash(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let args = json!({
            "p_patient_id": request.patient_id,
            "p_doctor_id": request.doctor_id,
            "p_branch_id": request.branch_id,
            "p_date": request.date.format("%Y-%m-%d").to_string(),
            "p_shift": request.shift,
        });

        let row: Value = self
            .supabase
            .rpc("book_cash_appointment", Some(auth_token), args)
            .await?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        debug!("Cash appointment booked with ID: {}", appointment.id);
        Ok(appointment)
    }

    async fn book_paymob(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let data = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "branch_id": request.branch_id,
            "date": request.date.format("%Y-%m-%d").to_string(),
            "shift": request.shift,
            "status": "confirmed",
            "payment_method": "paymob",
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("Failed to create appointment".to_string()))?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        debug!("Paymob appointment booked with ID: {}", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row).map_err(|e| AppointmentError::Database(e.to_string()))
    }

    pub async fn list_appointments(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch("/rest/v1/appointments?order=date.desc", auth_token).await
    }

    pub async fn list_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=date.desc",
            doctor_id
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn list_by_patient(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=date.desc",
            patient_id
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn list_cancelled_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=eq.cancelled&order=date.desc",
            doctor_id
        );
        self.fetch(&path, auth_token).await
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| AppointmentError::Database(e.to_string()))
            })
            .collect()
    }
}
