//! Backend health probe: `GET /api/status`.

use tracing::debug;

use voxmate_core::types::BackendStatus;
use voxmate_core::{VoxError, VoxResult};

use crate::http_provider::{status_error, transport_error, BackendClient};

/// Ask the backend whether it and its services are up.
pub async fn check_status(backend: &BackendClient) -> VoxResult<BackendStatus> {
    let response = backend
        .http()
        .get(backend.url("/api/status"))
        .send()
        .await
        .map_err(|e| transport_error("/api/status", e))?;

    if !response.status().is_success() {
        return Err(status_error("/api/status", response).await);
    }

    let status: BackendStatus = response
        .json()
        .await
        .map_err(|e| VoxError::Payload(format!("unreadable status response: {e}")))?;

    debug!(status = %status.status, services = status.services.len(), "Backend status");
    Ok(status)
}
