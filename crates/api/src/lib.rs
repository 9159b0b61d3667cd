//! HTTP API server with observability for the order desk.
//!
//! Provides REST endpoints for operator sessions, receipts and exports,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::OrderDesk;
use domain::{CredentialSet, WorkflowSettings};
use metrics_exporter_prometheus::PrometheusHandle;
use sheet_store::{InventorySheet, OrderLogSheet, SessionStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::sessions::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, St>(state: Arc<AppState<S, St>>, metrics_handle: PrometheusHandle) -> Router
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::scrape))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route("/sessions", post(routes::sessions::create::<S, St>))
        .route(
            "/sessions/{id}",
            get(routes::sessions::get::<S, St>).delete(routes::sessions::close::<S, St>),
        )
        .route(
            "/sessions/{id}/interactions",
            post(routes::sessions::interact::<S, St>),
        )
        .route("/sessions/{id}/receipt", get(routes::sessions::receipt::<S, St>))
        .route("/sessions/{id}/export", get(routes::sessions::export::<S, St>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around the given sheets and session store.
pub fn create_default_state<S, St>(
    sheets: S,
    sessions: St,
    credentials: CredentialSet,
    settings: WorkflowSettings,
) -> Arc<AppState<S, St>>
where
    S: InventorySheet + OrderLogSheet,
    St: SessionStore,
{
    Arc::new(AppState {
        desk: OrderDesk::new(sheets, sessions, credentials, settings),
    })
}
