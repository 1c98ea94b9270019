use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_doctor_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(register_doctor))
        .route("/", get(list_doctors))
        .route("/me", put(update_personal_info))
        .route("/{id}", get(get_doctor))
        .route("/{id}", put(update_doctor))
        .route("/{id}", delete(delete_doctor))
        .route("/branch/{branch_id}", get(list_doctors_by_branch))
        .route(
            "/specialization/{specialization_id}",
            get(list_doctors_by_specialization),
        )
        .route("/{id}/appointments/today", get(todays_appointments))
        .route("/{id}/appointments/{date}", get(appointments_by_date))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
