use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateScheduleRequest, ScheduleError, Shift, UpdateScheduleRequest};
use crate::services::ScheduleService;

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub shift: Option<Shift>,
}

fn map_schedule_error(err: ScheduleError) -> AppError {
    match err {
        ScheduleError::NotFound | ScheduleError::DoctorNotFound => {
            AppError::NotFound(err.to_string())
        }
        ScheduleError::DuplicateSchedule { .. } => AppError::Conflict(err.to_string()),
        ScheduleError::Validation(msg) => AppError::ValidationError(msg),
        ScheduleError::Database(msg) => AppError::Database(msg),
    }
}

// Doctors manage their own schedules; admin manages any.
fn authorize_schedule_write(user: &User, doctor_id: &str) -> Result<(), AppError> {
    if user.is_admin() || (user.is_doctor() && user.id == doctor_id) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Not authorized to manage this doctor's schedules".to_string(),
    ))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_schedule_write(&user, &request.doctor_id.to_string())?;

    let schedule = ScheduleService::new(&config)
        .create_schedule(request, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(schedule_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schedule = ScheduleService::new(&config)
        .get_schedule(&schedule_id, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn list_schedules(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let schedules = ScheduleService::new(&config)
        .list_schedules(auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "schedules": schedules,
        "total": schedules.len()
    })))
}

#[axum::debug_handler]
pub async fn list_schedules_by_day(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(day): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let schedules = match query.shift {
        Some(shift) => service
            .list_by_day_and_shift(&day, shift, auth.token())
            .await
            .map_err(map_schedule_error)?,
        None => service
            .list_by_day(&day, auth.token())
            .await
            .map_err(map_schedule_error)?,
    };

    Ok(Json(json!({
        "schedules": schedules,
        "total": schedules.len()
    })))
}

#[axum::debug_handler]
pub async fn list_schedules_by_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schedules = ScheduleService::new(&config)
        .list_by_doctor(&doctor_id, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "schedules": schedules,
        "total": schedules.len()
    })))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(schedule_id): Path<String>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let current = service
        .get_schedule(&schedule_id, auth.token())
        .await
        .map_err(map_schedule_error)?;
    authorize_schedule_write(&user, &current.doctor_id.to_string())?;

    let schedule = service
        .update_schedule(&schedule_id, request, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(schedule_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let current = service
        .get_schedule(&schedule_id, auth.token())
        .await
        .map_err(map_schedule_error)?;
    authorize_schedule_write(&user, &current.doctor_id.to_string())?;

    service
        .delete_schedule(&schedule_id, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "deleted": true })))
}
