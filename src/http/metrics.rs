//! Prometheus counters for the HTTP surface.
//!
//! Recording is a no-op until [`install_recorder`] has run, so handlers can
//! record unconditionally.

use anyhow::{Context, Result};
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the global Prometheus recorder and returns its render handle.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Count an image operation (query, content, upload, like, unlike, acl, delete).
pub(crate) fn record_image_operation(operation: &'static str) {
    counter!("imgrepo_image_operations_total", "operation" => operation).increment(1);
}

/// Count a rejected credential. `mode` is `strict` or `permissive`.
pub(crate) fn record_auth_failure(mode: &'static str) {
    counter!("imgrepo_auth_failures_total", "mode" => mode).increment(1);
}

/// Count accepted upload bytes.
pub(crate) fn record_upload_bytes(bytes: usize) {
    counter!("imgrepo_upload_bytes_total").increment(bytes as u64);
}
