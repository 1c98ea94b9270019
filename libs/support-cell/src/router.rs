use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_support_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_ticket))
        .route("/", get(list_all_tickets))
        .route("/me", get(list_my_tickets))
        .route("/{id}", get(get_ticket))
        .route("/{id}", put(update_ticket))
        .route("/{id}", delete(delete_ticket))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
