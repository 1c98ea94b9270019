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

use crate::models::{
    CatalogError, CreateBranchRequest, CreateMedicalServiceRequest, CreateSpecializationRequest,
    UpdateBranchRequest, UpdateMedicalServiceRequest, UpdateSpecializationRequest,
};
use crate::services::{BranchService, MedicalServiceCatalog, SpecializationService};

fn map_catalog_error(err: CatalogError) -> AppError {
    match err {
        CatalogError::BranchNotFound
        | CatalogError::SpecializationNotFound
        | CatalogError::ServiceNotFound => AppError::NotFound(err.to_string()),
        CatalogError::SpecializationExists { .. } => AppError::Conflict(err.to_string()),
        CatalogError::Validation(msg) => AppError::ValidationError(msg),
        CatalogError::Database(msg) => AppError::Database(msg),
    }
}

fn require_admin(user: &User) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }
    Ok(())
}

// ---- Branches ----

#[axum::debug_handler]
pub async fn create_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBranchRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let branch = BranchService::new(&config)
        .create_branch(request, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(branch)))
}

#[axum::debug_handler]
pub async fn get_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(branch_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let branch = BranchService::new(&config)
        .get_branch(&branch_id, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(branch)))
}

#[axum::debug_handler]
pub async fn list_branches(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let branches = BranchService::new(&config)
        .list_branches(auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "branches": branches,
        "total": branches.len()
    })))
}

#[axum::debug_handler]
pub async fn update_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(branch_id): Path<String>,
    Json(request): Json<UpdateBranchRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let branch = BranchService::new(&config)
        .update_branch(&branch_id, request, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(branch)))
}

#[axum::debug_handler]
pub async fn delete_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(branch_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    BranchService::new(&config)
        .delete_branch(&branch_id, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "deleted": true })))
}

// ---- Specializations ----

#[axum::debug_handler]
pub async fn create_specialization(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSpecializationRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let specialization = SpecializationService::new(&config)
        .create_specialization(request, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(specialization)))
}

#[axum::debug_handler]
pub async fn get_specialization(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(specialization_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let specialization = SpecializationService::new(&config)
        .get_specialization(&specialization_id, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(specialization)))
}

#[axum::debug_handler]
pub async fn list_specializations(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let specializations = SpecializationService::new(&config)
        .list_specializations(auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "specializations": specializations,
        "total": specializations.len()
    })))
}

#[axum::debug_handler]
pub async fn list_specializations_by_branch(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(branch_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let specializations = SpecializationService::new(&config)
        .list_by_branch(&branch_id, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "specializations": specializations,
        "total": specializations.len()
    })))
}

#[axum::debug_handler]
pub async fn update_specialization(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(specialization_id): Path<String>,
    Json(request): Json<UpdateSpecializationRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let specialization = SpecializationService::new(&config)
        .update_specialization(&specialization_id, request, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(specialization)))
}

#[axum::debug_handler]
pub async fn delete_specialization(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(specialization_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    SpecializationService::new(&config)
        .delete_specialization(&specialization_id, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "deleted": true })))
}

// ---- Medical services ----

#[axum::debug_handler]
pub async fn create_service(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateMedicalServiceRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = MedicalServiceCatalog::new(&config)
        .create_service(request, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn get_service(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalServiceCatalog::new(&config)
        .get_service(&service_id, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn list_services(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let services = MedicalServiceCatalog::new(&config)
        .list_services(auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "services": services,
        "total": services.len()
    })))
}

#[axum::debug_handler]
pub async fn update_service(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
    Json(request): Json<UpdateMedicalServiceRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = MedicalServiceCatalog::new(&config)
        .update_service(&service_id, request, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn delete_service(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    MedicalServiceCatalog::new(&config)
        .delete_service(&service_id, auth.token())
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "deleted": true })))
}
