//! Run the image repository HTTP server.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::auth::JwtCodec;
use crate::http::{self, AppState, HttpOptions};

/// Serve the HTTP API until Ctrl-C.
///
/// `port_override` takes precedence over `server.port`.
pub async fn execute(config_path: Option<&Path>, port_override: Option<u16>) -> Result<()> {
    let config = super::load_config(config_path)?;

    let secret = config.auth.secret()?;
    let codec = JwtCodec::new(secret.as_bytes(), config.auth.token_ttl());
    let (records, blobs) = super::open_stores(&config)?;

    let mut state = AppState::new(records, blobs, codec, config.query.limits())
        .with_cookie_name(&config.auth.cookie_name);
    if config.server.metrics {
        state = state.with_metrics(http::metrics::install_recorder()?);
        info!("Prometheus metrics enabled on /metrics");
    }

    let options = HttpOptions {
        max_upload_bytes: config.server.max_upload_bytes,
        request_timeout: config.server.request_timeout(),
    };

    let port = port_override.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port)
        .parse()
        .with_context(|| format!("Invalid bind address: {}:{port}", config.server.host))?;

    http::serve(state, &options, addr).await
}
