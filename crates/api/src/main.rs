//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::sessions::AppState;
use metrics_exporter_prometheus::PrometheusHandle;
use sheet_store::{
    InMemorySessionStore, InMemorySheetStore, InventorySheet, OrderLogSheet, PostgresSheetStore,
    SessionStore,
};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S, St>(config: &Config, state: Arc<AppState<S, St>>, metrics_handle: PrometheusHandle)
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration
    let config = Config::from_env().expect("invalid configuration");

    // 2. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.credentials.is_empty() {
        tracing::warn!("ORDER_DESK_CREDENTIALS is empty; nobody can log in");
    }

    // 3. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 4. Pick the sheet backend and serve
    let settings = config.workflow_settings();
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .expect("failed to connect to Postgres");
            let store = PostgresSheetStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using Postgres sheets");

            let state = api::create_default_state(
                store.clone(),
                store,
                config.credentials.clone(),
                settings,
            );
            serve(&config, state, metrics_handle).await;
        }
        None => {
            let seed = config
                .load_inventory_seed()
                .expect("failed to load inventory seed");
            tracing::info!(rows = seed.len(), "using in-memory sheets");

            let state = api::create_default_state(
                InMemorySheetStore::with_inventory(seed),
                InMemorySessionStore::new(),
                config.credentials.clone(),
                settings,
            );
            serve(&config, state, metrics_handle).await;
        }
    }
}
