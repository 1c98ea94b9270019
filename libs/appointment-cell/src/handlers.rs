use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest};
use crate::services::{AppointmentBookingService, AppointmentLifecycleService};

fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound
        | AppointmentError::PatientNotFound
        | AppointmentError::DoctorNotFound
        | AppointmentError::BranchNotFound => AppError::NotFound(err.to_string()),
        AppointmentError::DuplicateBooking => AppError::Conflict(err.to_string()),
        AppointmentError::DateInPast
        | AppointmentError::ShiftElapsed(_)
        | AppointmentError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
        AppointmentError::Validation(msg) => AppError::ValidationError(msg),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let is_self = request.patient_id.to_string() == user.id;
    if !is_self && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to book an appointment for this patient".to_string(),
        ));
    }

    let appointment = AppointmentBookingService::new(&config)
        .book_appointment(request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&config)
        .get_appointment(&appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    let is_participant = appointment.patient_id.to_string() == user.id
        || appointment.doctor_id.to_string() == user.id;
    if !is_participant && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    let appointments = AppointmentBookingService::new(&config)
        .list_appointments(auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_by_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Not authorized to view this doctor's appointments".to_string(),
        ));
    }

    let appointments = AppointmentBookingService::new(&config)
        .list_by_doctor(&doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_by_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && !user.is_doctor() && user.id != patient_id {
        return Err(AppError::Forbidden(
            "Not authorized to view this patient's appointments".to_string(),
        ));
    }

    let appointments = AppointmentBookingService::new(&config)
        .list_by_patient(&patient_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_cancelled_by_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Not authorized to view this doctor's appointments".to_string(),
        ));
    }

    let appointments = AppointmentBookingService::new(&config)
        .list_cancelled_by_doctor(&doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn mark_completed(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor role required".to_string()));
    }

    let appointment = AppointmentLifecycleService::new(&config)
        .mark_completed(&appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking = AppointmentBookingService::new(&config);
    let current = booking
        .get_appointment(&appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    let is_participant = current.patient_id.to_string() == user.id
        || current.doctor_id.to_string() == user.id;
    if !is_participant && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this appointment".to_string(),
        ));
    }

    let appointment = AppointmentLifecycleService::new(&config)
        .cancel_appointment(&appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_for_doctor_on_date(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, date)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this doctor's appointments".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".to_string()))?;

    let cancelled = AppointmentLifecycleService::new(&config)
        .cancel_for_doctor_on_date(&doctor_id, date, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "cancelled": cancelled })))
}
