//! HTTP surface.
//!
//! Routes requests to the access layer. Handlers are thin: identity comes
//! from the extractors in [`extract`], the work happens in
//! [`crate::access`], and [`AppError`] maps the outcome to a status code.
//!
//! # Endpoints
//!
//! | Method | Path | Identity |
//! |--------|------|----------|
//! | GET | `/health` | none |
//! | GET | `/metrics` | none |
//! | GET | `/images` | permissive |
//! | POST | `/images` | strict |
//! | GET | `/images/{id}/content` | permissive |
//! | PATCH, DELETE | `/images/{id}/likes` | strict |
//! | PATCH | `/images/{id}/acl` | strict |
//! | DELETE | `/images/{id}` | strict |
//! | GET | `/users` | none |

mod error;
pub mod extract;
mod handlers;
pub mod metrics;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

pub use error::AppError;

use crate::access::{ImageReader, MutationExecutor, QueryLimits};
use crate::auth::{IdentityResolver, TokenVerifier};
use crate::blob::BlobStore;
use crate::constants;
use crate::store::RecordStore;

// =============================================================================
// State
// =============================================================================

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityResolver,
    pub reader: ImageReader,
    pub mutations: MutationExecutor,
    pub cookie_name: Arc<str>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires the services over one record store and one blob store.
    pub fn new(
        records: RecordStore,
        blobs: BlobStore,
        verifier: impl TokenVerifier,
        limits: QueryLimits,
    ) -> Self {
        Self {
            identity: IdentityResolver::new(verifier, records.clone()),
            reader: ImageReader::new(records.clone(), blobs.clone(), limits),
            mutations: MutationExecutor::new(records, blobs),
            cookie_name: Arc::from(constants::DEFAULT_COOKIE_NAME),
            metrics: None,
        }
    }

    /// Read the session credential from a different cookie.
    #[must_use]
    pub fn with_cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = Arc::from(name);
        self
    }

    /// Serve `/metrics` from this Prometheus handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Transport limits applied around the router.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: constants::MAX_UPLOAD_BYTES,
            request_timeout: Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Builds the application router.
#[allow(deprecated)] // TimeoutLayer::new
pub fn router(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/images",
            get(handlers::query_images).post(handlers::upload_image),
        )
        .route("/images/{id}", delete(handlers::delete_image))
        .route("/images/{id}/content", get(handlers::get_content))
        .route(
            "/images/{id}/likes",
            patch(handlers::like_image).delete(handlers::unlike_image),
        )
        .route("/images/{id}/acl", patch(handlers::edit_acl))
        .route("/users", get(handlers::query_users))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(options.request_timeout))
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, options: &HttpOptions, addr: SocketAddr) -> Result<()> {
    let app = router(state, options);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Image repository listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Image repository stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
