//! The events webhook: the URL-verification handshake is answered inline,
//! everything else is acknowledged immediately and handled in a spawned task.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::error;

use crate::dto::events::{CallbackEvent, EventEnvelope};
use crate::services::round_service;
use crate::state::SharedState;

/// Handle one events webhook delivery.
pub async fn events(
    State(state): State<SharedState>,
    Json(envelope): Json<EventEnvelope>,
) -> axum::response::Response {
    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback { event } => {
            tokio::spawn(handle_event(state, event));
            StatusCode::OK.into_response()
        }
        EventEnvelope::Other => StatusCode::OK.into_response(),
    }
}

/// Dispatch a workspace event. Failures are logged, never surfaced: these are
/// implicit detection paths.
async fn handle_event(state: SharedState, event: CallbackEvent) {
    match event {
        CallbackEvent::ReactionAdded { user, reaction, item } => {
            if let Err(err) =
                round_service::handle_reaction(&state, &user, &reaction, &item.channel, &item.ts)
                    .await
            {
                error!(user, channel = item.channel, error = %err, "reaction handling failed");
            }
        }
        CallbackEvent::Message(message) => {
            // Edits, joins, and other subtypes are not guesses.
            if message.subtype.is_some() {
                return;
            }
            if let Err(err) = round_service::handle_thread_message(
                &state,
                &message.channel,
                message.user.as_deref(),
                &message.text,
                message.thread_ts.as_deref(),
            )
            .await
            {
                error!(channel = message.channel, error = %err, "message handling failed");
            }
        }
        CallbackEvent::Other => {}
    }
}

/// Configure the events routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/slack/events", post(events))
}
