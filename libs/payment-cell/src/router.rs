use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_payment_router(config: Arc<AppConfig>) -> Router {
    // Gateway callbacks carry no bearer token, so the webhook sits outside
    // the auth middleware.
    let public_routes = Router::new().route("/callback", post(paymob_callback));

    let protected_routes = Router::new()
        .route("/{id}", get(get_payment))
        .route("/appointment/{appointment_id}", post(create_payment))
        .route("/appointment/{appointment_id}", get(get_payment_for_appointment))
        .route(
            "/appointment/{appointment_id}/settle-cash",
            put(settle_cash_payment),
        )
        .route("/revenue/total", get(total_revenue))
        .route("/revenue/branch/{branch_id}", get(revenue_for_branch))
        .route("/revenue/doctor/{doctor_id}", get(revenue_for_doctor))
        .route(
            "/revenue/doctor/{doctor_id}/branch/{branch_id}",
            get(revenue_for_doctor_in_branch),
        )
        .route("/revenue/month", get(revenue_for_month))
        .route("/revenue/year/{year}", get(revenue_for_year))
        .route("/revenue/monthly-trend", get(monthly_trend))
        .route("/revenue/by-branch", get(revenue_by_branch))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(config)
}
