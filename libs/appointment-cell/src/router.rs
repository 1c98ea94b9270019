use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_appointment_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(book_appointment))
        .route("/", get(list_appointments))
        .route("/{id}", get(get_appointment))
        .route("/{id}/complete", put(mark_completed))
        .route("/{id}/cancel", put(cancel_appointment))
        .route("/doctor/{doctor_id}", get(list_by_doctor))
        .route("/doctor/{doctor_id}/cancelled", get(list_cancelled_by_doctor))
        .route(
            "/doctor/{doctor_id}/cancel-day/{date}",
            put(cancel_for_doctor_on_date),
        )
        .route("/patient/{patient_id}", get(list_by_patient))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
