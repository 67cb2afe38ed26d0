//! Reporting backend for an ERP database.
//!
//! Analytical SQL runs through a [`db::QueryExecutor`], report services
//! reshape the rows into wide tables, and the HTTP layer serves them as JSON.

pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::{config::AppConfig, db::Database, services::Services};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub services: Services,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Self {
        let services = Services::new(&db);
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            services,
        }
    }
}

pub fn build_app(config: &AppConfig, state: AppState) -> Router {
    let debug = config.server.debug;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        .merge(routes::report_routes())
        .layer(CatchPanicLayer::custom(move |panic| {
            routes::panic_response(panic, debug)
        }))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .with_state(state)
}
