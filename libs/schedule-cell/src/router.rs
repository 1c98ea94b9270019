use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_schedule_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_schedule))
        .route("/", get(list_schedules))
        .route("/{id}", get(get_schedule))
        .route("/{id}", put(update_schedule))
        .route("/{id}", delete(delete_schedule))
        .route("/day/{day}", get(list_schedules_by_day))
        .route("/doctor/{doctor_id}", get(list_schedules_by_doctor))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
