use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::create_appointment_router;
use auth_cell::router::auth_routes;
use catalog_cell::router::create_catalog_router;
use doctor_cell::router::create_doctor_router;
use medical_record_cell::router::create_medical_record_router;
use patient_cell::router::create_patient_router;
use payment_cell::router::create_payment_router;
use schedule_cell::router::create_schedule_router;
use shared_config::AppConfig;
use support_cell::router::create_support_router;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "NileCare API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/doctors", create_doctor_router(state.clone()))
        .nest("/schedules", create_schedule_router(state.clone()))
        .nest("/appointments", create_appointment_router(state.clone()))
        .nest("/catalog", create_catalog_router(state.clone()))
        .nest("/medical-records", create_medical_record_router(state.clone()))
        .nest("/support", create_support_router(state.clone()))
        .nest("/payments", create_payment_router(state.clone()))
}
