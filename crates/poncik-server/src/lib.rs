//! HTTP and WebSocket surface for PoncikFocus.
//!
//! Handlers resolve the caller from the session cookie (or bearer token),
//! lock the database for the duration of one read-modify-write cycle and
//! map every [`CoreError`](poncik_core::CoreError) onto a status code.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod realtime;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use poncik_core::integrations::{IdentityClient, MusicOAuth, PaymentsClient, PushRelay};
use poncik_core::{Config, Database};
use tokio::sync::Mutex;

pub use error::{ApiError, ApiResult};
pub use realtime::ConnectionRegistry;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<Config>,
    pub registry: Arc<ConnectionRegistry>,
    pub identity: Arc<IdentityClient>,
    pub payments: Arc<PaymentsClient>,
    pub push: Arc<PushRelay>,
    pub music: Arc<MusicOAuth>,
}

impl AppState {
    pub fn new(db: Database, config: Config, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            identity: Arc::new(IdentityClient::from_config(&config.auth)),
            payments: Arc::new(PaymentsClient::new(&config.payments)),
            push: Arc::new(PushRelay::new(&config.push)),
            music: Arc::new(MusicOAuth::new(&config.music)),
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
            registry,
        }
    }
}

/// Full application router with middleware applied.
pub fn app(state: AppState) -> Router {
    routes::router(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cors_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_tracing_middleware))
}
