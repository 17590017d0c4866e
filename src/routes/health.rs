use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::state::SharedState;

/// Simple health response returned by the `/healthz` route.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
}

/// Return the current health status, pinging the chat platform through the
/// identity lookup.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    let status = match state.bot_user_id().await {
        Ok(_) => "ok",
        Err(err) => {
            warn!(error = %err, "chat platform identity lookup failed");
            "degraded"
        }
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/healthz", get(healthcheck))
}
