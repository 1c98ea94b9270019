use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn create_catalog_router(config: Arc<AppConfig>) -> Router {
    let branches = Router::new()
        .route("/", post(create_branch))
        .route("/", get(list_branches))
        .route("/{id}", get(get_branch))
        .route("/{id}", put(update_branch))
        .route("/{id}", delete(delete_branch));

    let specializations = Router::new()
        .route("/", post(create_specialization))
        .route("/", get(list_specializations))
        .route("/{id}", get(get_specialization))
        .route("/{id}", put(update_specialization))
        .route("/{id}", delete(delete_specialization))
        .route("/branch/{branch_id}", get(list_specializations_by_branch));

    let services = Router::new()
        .route("/", post(create_service))
        .route("/", get(list_services))
        .route("/{id}", get(get_service))
        .route("/{id}", put(update_service))
        .route("/{id}", delete(delete_service));

    Router::new()
        .nest("/branches", branches)
        .nest("/specializations", specializations)
        .nest("/services", services)
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
