// src/lib.rs

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod aggregate;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod store;

use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self { store: Arc::new(store) }
    }
}

/// The dashboard API.
pub fn app(state: AppState) -> Router {
    // The dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        // products dashboard
        .route("/api/products", get(routes::products::get_products))
        // directory
        .route("/api/customer", get(routes::customers::list_customers))
        .route(
            "/api/employee",
            get(routes::employees::list_employees).patch(routes::employees::patch_role),
        )
        // marketing email lists
        .route(
            "/api/marketing",
            get(routes::marketing::get_lists)
                .post(routes::marketing::post_action)
                .delete(routes::marketing::delete_list),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
