//! Security audit logging.
//!
//! Provides structured audit logging for events an operator has to act on:
//! rejected credentials, and record/blob pairs left inconsistent by a
//! partially failed mutation.

use tracing::{error, warn};

/// Security audit events that should be logged for monitoring and alerting.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// A strict endpoint rejected the caller's credential.
    AuthFailure { path: String, reason: String },
    /// The image record was deleted but its blob could not be.
    OrphanedBlob { key: String, error: String },
    /// A failed upload left a record behind that could not be removed.
    CompensationFailed { image: String, error: String },
}

/// Log a security audit event with structured fields.
pub fn log_audit_event(event: AuditEvent) {
    match event {
        AuditEvent::AuthFailure { path, reason } => {
            warn!(
                target: "audit",
                event_type = "auth_failure",
                %path,
                %reason,
                "Authentication failed"
            );
        },
        AuditEvent::OrphanedBlob { key, error } => {
            error!(
                target: "audit",
                event_type = "orphaned_blob",
                %key,
                %error,
                "Image deleted but blob removal failed; run `imgrepo reconcile`"
            );
        },
        AuditEvent::CompensationFailed { image, error } => {
            error!(
                target: "audit",
                event_type = "compensation_failed",
                %image,
                %error,
                "Upload failed and the image record could not be removed"
            );
        },
    }
}
