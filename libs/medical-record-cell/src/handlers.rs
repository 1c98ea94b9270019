use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateMedicalRecordRequest, MedicalRecordError, UpdateMedicalRecordRequest};
use crate::services::MedicalRecordService;

fn map_record_error(err: MedicalRecordError) -> AppError {
    match err {
        MedicalRecordError::NotFound
        | MedicalRecordError::PatientNotFound
        | MedicalRecordError::DoctorNotFound => AppError::NotFound(err.to_string()),
        MedicalRecordError::Validation(msg) => AppError::ValidationError(msg),
        MedicalRecordError::Database(msg) => AppError::Database(msg),
    }
}

fn require_doctor(user: &User) -> Result<(), AppError> {
    if !user.is_admin() && !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor role required".to_string()));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn create_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateMedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let record = MedicalRecordService::new(&config)
        .create_record(request, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn get_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let record = MedicalRecordService::new(&config)
        .get_record(&record_id, auth.token())
        .await
        .map_err(map_record_error)?;

    let is_participant =
        record.patient_id.to_string() == user.id || record.doctor_id.to_string() == user.id;
    if !is_participant && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to view this medical record".to_string(),
        ));
    }

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn update_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<String>,
    Json(request): Json<UpdateMedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let record = MedicalRecordService::new(&config)
        .update_record(&record_id, request, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn delete_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    MedicalRecordService::new(&config)
        .delete_record(&record_id, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!({ "message": "Medical record deleted" })))
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
            "Not authorized to view this doctor's records".to_string(),
        ));
    }

    let records = MedicalRecordService::new(&config)
        .list_by_doctor(&doctor_id, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!({
        "records": records,
        "total": records.len()
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
            "Not authorized to view this patient's records".to_string(),
        ));
    }

    let records = MedicalRecordService::new(&config)
        .list_by_patient(&patient_id, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!({
        "records": records,
        "total": records.len()
    })))
}
