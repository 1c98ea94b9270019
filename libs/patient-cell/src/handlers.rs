use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreatePatientRequest, PatientError, PatientSearchQuery, UpdatePatientRequest};
use crate::services::PatientService;

fn map_patient_error(err: PatientError) -> AppError {
    match err {
        PatientError::NotFound => AppError::NotFound(err.to_string()),
        PatientError::EmailAlreadyExists { .. } => AppError::Conflict(err.to_string()),
        PatientError::Validation(msg) => AppError::ValidationError(msg),
        PatientError::Database(msg) => AppError::Database(msg),
    }
}

// Patients may only touch their own profile; staff roles see everything.
fn authorize_access(user: &User, patient_id: &str) -> Result<(), AppError> {
    if user.is_admin() || user.is_doctor() || user.id == patient_id {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Not authorized to access this patient's data".to_string(),
    ))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&config)
        .create_patient(request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize_access(&user, &patient_id)?;

    let patient = PatientService::new(&config)
        .get_patient(&patient_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && !user.is_doctor() {
        return Err(AppError::Forbidden("Staff role required".to_string()));
    }

    let patients = PatientService::new(&config)
        .list_patients(auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_access(&user, &patient_id)?;

    let patient = PatientService::new(&config)
        .update_patient(&patient_id, request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    PatientService::new(&config)
        .delete_patient(&patient_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && !user.is_doctor() {
        return Err(AppError::Forbidden("Staff role required".to_string()));
    }

    let patients = PatientService::new(&config)
        .search_patients(query, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}
