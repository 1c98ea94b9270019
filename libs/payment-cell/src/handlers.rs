use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{PaymentError, PaymobCallback};
use crate::services::{PaymentService, RevenueService};

fn map_payment_error(err: PaymentError) -> AppError {
    match err {
        PaymentError::NotFound
        | PaymentError::AppointmentNotFound
        | PaymentError::DoctorNotFound
        | PaymentError::BranchNotFound => AppError::NotFound(err.to_string()),
        PaymentError::PaymentExists => AppError::Conflict(err.to_string()),
        PaymentError::NotAppointmentPatient => AppError::Forbidden(err.to_string()),
        PaymentError::InvalidTransactionId => AppError::BadRequest(err.to_string()),
        PaymentError::Gateway(msg) => AppError::ExternalService(msg),
        PaymentError::Validation(msg) => AppError::ValidationError(msg),
        PaymentError::Database(msg) => AppError::Database(msg),
    }
}

fn require_admin(user: &User) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: i32,
}

#[axum::debug_handler]
pub async fn create_payment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let key = PaymentService::new(&config)
        .create_payment_for_appointment(appointment_id, &user.id, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!(key)))
}

#[axum::debug_handler]
pub async fn get_payment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(payment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && !user.is_doctor() {
        return Err(AppError::Forbidden("Staff role required".to_string()));
    }

    let payment = PaymentService::new(&config)
        .get_payment(&payment_id, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!(payment)))
}

#[axum::debug_handler]
pub async fn get_payment_for_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let payment = PaymentService::new(&config)
        .get_payment_for_appointment(&appointment_id, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!(payment)))
}

/// Gateway webhook; mounted outside the auth middleware because Paymob signs
/// in with nothing but the callback payload.
#[axum::debug_handler]
pub async fn paymob_callback(
    State(config): State<Arc<AppConfig>>,
    Json(callback): Json<PaymobCallback>,
) -> Result<Json<Value>, AppError> {
    let payment = PaymentService::new(&config)
        .handle_callback(callback)
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({
        "payment_id": payment.id,
        "status": payment.status
    })))
}

#[axum::debug_handler]
pub async fn settle_cash_payment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor role required".to_string()));
    }

    let payment = PaymentService::new(&config)
        .settle_cash_payment(&appointment_id, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!(payment)))
}

#[axum::debug_handler]
pub async fn total_revenue(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let total = RevenueService::new(&config)
        .total_revenue(auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "total_revenue": total })))
}

#[axum::debug_handler]
pub async fn revenue_for_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(branch_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let total = RevenueService::new(&config)
        .revenue_for_branch(branch_id, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "total_revenue": total })))
}

#[axum::debug_handler]
pub async fn revenue_for_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let total = RevenueService::new(&config)
        .revenue_for_doctor(doctor_id, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "total_revenue": total })))
}

#[axum::debug_handler]
pub async fn revenue_for_doctor_in_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, branch_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let total = RevenueService::new(&config)
        .revenue_for_doctor_in_branch(doctor_id, branch_id, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "total_revenue": total })))
}

#[axum::debug_handler]
pub async fn revenue_for_month(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let total = RevenueService::new(&config)
        .revenue_for_month(query.year, query.month, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "total_revenue": total })))
}

#[axum::debug_handler]
pub async fn revenue_for_year(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(year): Path<i32>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let total = RevenueService::new(&config)
        .revenue_for_year(year, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "total_revenue": total })))
}

#[axum::debug_handler]
pub async fn monthly_trend(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let data = RevenueService::new(&config)
        .monthly_trend_for_year(query.year, auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "data": data })))
}

#[axum::debug_handler]
pub async fn revenue_by_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let data = RevenueService::new(&config)
        .revenue_by_branch(auth.token())
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "data": data })))
}
