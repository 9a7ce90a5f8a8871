use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use expense_tracker_backend::auth::RemoteAuthProvider;
use expense_tracker_backend::config::AppConfig;
use expense_tracker_backend::domain::auth_service::AuthService;
use expense_tracker_backend::domain::expense_service::ExpenseService;
use expense_tracker_backend::rest::{self, AppState};
use expense_tracker_backend::storage::{
    FailoverExpenseStore, LocalExpenseStore, RemoteExpenseStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    if !config.is_configured() {
        warn!("No backend credentials configured; every operation will fall back to the local cache");
    }

    // The persistence port: remote row store first, local JSON cache when
    // the backend is unreachable. Built once here and injected everywhere.
    let remote = RemoteExpenseStore::builder()
        .base_url(&config.backend_url)
        .api_key(&config.backend_api_key)
        .build()?;
    let local = LocalExpenseStore::new(config.data_dir.clone())?;
    let store = Arc::new(FailoverExpenseStore::new(remote, local));

    let auth_provider = Arc::new(RemoteAuthProvider::new(
        &config.backend_url,
        &config.backend_api_key,
    )?);

    let state = AppState::new(
        ExpenseService::new(store),
        AuthService::new(auth_provider),
    );

    // CORS setup so a browser frontend on another port can call us.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = rest::router(state).layer(cors);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
