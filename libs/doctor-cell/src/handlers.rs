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

use crate::models::{
    DoctorError, RegisterDoctorRequest, UpdateDoctorPersonalInfoRequest, UpdateDoctorRequest,
};
use crate::services::{DoctorAgendaService, DoctorService};

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound
        | DoctorError::SpecializationNotFound
        | DoctorError::BranchesNotFound(_) => AppError::NotFound(err.to_string()),
        DoctorError::EmailAlreadyExists { .. } => AppError::Conflict(err.to_string()),
        DoctorError::Validation(msg) => AppError::ValidationError(msg),
        DoctorError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    let doctor = DoctorService::new(&config)
        .register_doctor(request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&config)
        .get_doctor(&doctor_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&config)
        .list_doctors(auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn list_doctors_by_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(branch_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&config)
        .list_doctors_by_branch(&branch_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn list_doctors_by_specialization(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(specialization_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&config)
        .list_doctors_by_specialization(&specialization_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    let doctor = DoctorService::new(&config)
        .update_doctor(&doctor_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_personal_info(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorPersonalInfoRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor role required".to_string()));
    }

    let doctor = DoctorService::new(&config)
        .update_personal_info(&user.id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    DoctorService::new(&config)
        .delete_doctor(&doctor_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn todays_appointments(
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

    let appointments = DoctorAgendaService::new(&config)
        .appointments_today(&doctor_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn appointments_by_date(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, date)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Not authorized to view this doctor's appointments".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".to_string()))?;

    let appointments = DoctorAgendaService::new(&config)
        .appointments_on_date(&doctor_id, date, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}
