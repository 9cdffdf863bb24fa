//! Request and response bodies.

use serde::{Deserialize, Serialize};

use crate::model::RecordId;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response to a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertResponse {
    #[serde(rename = "_id")]
    pub id: RecordId,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
