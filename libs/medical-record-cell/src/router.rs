use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_medical_record_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_record))
        .route("/{id}", get(get_record))
        .route("/{id}", put(update_record))
        .route("/{id}", delete(delete_record))
        .route("/doctor/{doctor_id}", get(list_by_doctor))
        .route("/patient/{patient_id}", get(list_by_patient))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
