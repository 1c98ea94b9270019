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

use crate::models::{CreateTicketRequest, SupportError, UpdateTicketRequest};
use crate::services::SupportTicketService;

fn map_support_error(err: SupportError) -> AppError {
    match err {
        SupportError::NotFound => AppError::NotFound(err.to_string()),
        SupportError::Validation(msg) => AppError::ValidationError(msg),
        SupportError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_ticket(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateTicketRequest>,
) -> Result<Json<Value>, AppError> {
    let ticket = SupportTicketService::new(&config)
        .create_ticket(&user.id, request, auth.token())
        .await
        .map_err(map_support_error)?;

    Ok(Json(json!(ticket)))
}

#[axum::debug_handler]
pub async fn get_ticket(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let ticket = SupportTicketService::new(&config)
        .get_ticket(&ticket_id, auth.token())
        .await
        .map_err(map_support_error)?;

    if ticket.user_id.to_string() != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to view this ticket".to_string(),
        ));
    }

    Ok(Json(json!(ticket)))
}

#[axum::debug_handler]
pub async fn update_ticket(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<String>,
    Json(request): Json<UpdateTicketRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SupportTicketService::new(&config);
    let current = service
        .get_ticket(&ticket_id, auth.token())
        .await
        .map_err(map_support_error)?;

    if current.user_id.to_string() != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to update this ticket".to_string(),
        ));
    }

    // Only staff move tickets through the workflow; owners edit content.
    if request.status.is_some() && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only an admin can change the ticket status".to_string(),
        ));
    }

    let ticket = service
        .update_ticket(&ticket_id, request, auth.token())
        .await
        .map_err(map_support_error)?;

    Ok(Json(json!(ticket)))
}

#[axum::debug_handler]
pub async fn delete_ticket(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = SupportTicketService::new(&config);
    let current = service
        .get_ticket(&ticket_id, auth.token())
        .await
        .map_err(map_support_error)?;

    if current.user_id.to_string() != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to delete this ticket".to_string(),
        ));
    }

    service
        .delete_ticket(&ticket_id, auth.token())
        .await
        .map_err(map_support_error)?;

    Ok(Json(json!({ "message": "Ticket deleted" })))
}

#[axum::debug_handler]
pub async fn list_my_tickets(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let tickets = SupportTicketService::new(&config)
        .list_by_user(&user.id, auth.token())
        .await
        .map_err(map_support_error)?;

    Ok(Json(json!({
        "tickets": tickets,
        "total": tickets.len()
    })))
}

#[axum::debug_handler]
pub async fn list_all_tickets(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    let tickets = SupportTicketService::new(&config)
        .list_all(auth.token())
        .await
        .map_err(map_support_error)?;

    Ok(Json(json!({
        "tickets": tickets,
        "total": tickets.len()
    })))
}
