//! The interactivity webhook: button presses and modal submissions. The
//! handler acknowledges every delivery immediately (so the client never shows
//! a stuck spinner) and runs the possibly-slow multi-step transitions in a
//! spawned task.

use axum::extract::Form;
use axum::{Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use tracing::{error, warn};

use crate::dto::actions::{Action, InteractionPayload, ViewPayload, ids};
use crate::error::{AppError, ServiceError};
use crate::round::codec::decode_thread_ref;
use crate::services::{confirm_service, round_service};
use crate::state::SharedState;

/// Interactivity deliveries arrive as a form with a single JSON field.
#[derive(Debug, Deserialize)]
pub struct InteractionForm {
    /// JSON-encoded [`InteractionPayload`].
    pub payload: String,
}

/// Handle one interactivity webhook delivery.
pub async fn interactivity(
    State(state): State<SharedState>,
    Form(form): Form<InteractionForm>,
) -> Result<StatusCode, AppError> {
    let payload: InteractionPayload = serde_json::from_str(&form.payload)
        .map_err(|err| AppError::BadRequest(format!("undecodable interaction payload: {err}")))?;
    tokio::spawn(handle_interaction(state, payload));
    Ok(StatusCode::OK)
}

async fn handle_interaction(state: SharedState, payload: InteractionPayload) {
    match payload {
        InteractionPayload::BlockActions {
            user,
            trigger_id,
            actions,
            channel,
        } => {
            for invocation in actions {
                let Some(action) =
                    Action::parse(&invocation.action_id, invocation.value.as_deref())
                else {
                    warn!(action_id = invocation.action_id, "ignoring unknown action");
                    continue;
                };
                if let Err(err) = dispatch_action(&state, &user.id, &trigger_id, action).await {
                    error!(
                        user = user.id,
                        action_id = invocation.action_id,
                        error = %err,
                        "action failed"
                    );
                    notify_failure(&state, channel.as_ref().map(|c| c.id.as_str()), &user.id, &err)
                        .await;
                }
            }
        }
        InteractionPayload::ViewSubmission { user, view } => {
            if let Err(err) = dispatch_view(&state, &user.id, &view).await {
                error!(user = user.id, callback_id = view.callback_id, error = %err, "modal failed");
                notify_failure(&state, None, &user.id, &err).await;
            }
        }
        InteractionPayload::Other => {}
    }
}

async fn dispatch_action(
    state: &SharedState,
    user: &str,
    trigger_id: &str,
    action: Action,
) -> Result<(), ServiceError> {
    match action {
        Action::ConfirmSolve(payload) | Action::ConfirmPrivateSolve(payload) => {
            confirm_service::confirm(state, payload).await
        }
        Action::CancelSolve(payload) | Action::CancelPrivateSolve(payload) => {
            confirm_service::cancel(state, payload).await
        }
        Action::SubmitPrivateAnswer { channel, thread_ts } => {
            round_service::open_private_answer_modal(state, &channel, &thread_ts, user, trigger_id)
                .await
        }
        Action::EditQuestion { channel, thread_ts } => {
            round_service::open_edit_modal(state, &channel, &thread_ts, user, trigger_id).await
        }
        Action::CloseRound { channel, thread_ts } => {
            round_service::close_round(state, &channel, &thread_ts, user).await
        }
        Action::ViewAnswer { channel, thread_ts } => {
            let text = round_service::view_answer(state, &channel, &thread_ts).await?;
            state.chat().post_ephemeral(&channel, user, &text).await?;
            Ok(())
        }
    }
}

async fn dispatch_view(
    state: &SharedState,
    user: &str,
    view: &ViewPayload,
) -> Result<(), ServiceError> {
    let (channel, thread_ts) = decode_thread_ref(&view.private_metadata).ok_or_else(|| {
        ServiceError::InvalidInput("this dialog has lost track of its round".into())
    })?;
    match view.callback_id.as_str() {
        ids::PRIVATE_ANSWER_MODAL => {
            let answer = view.input_value(round_service::ANSWER_INPUT).unwrap_or_default();
            round_service::submit_private_answer(state, user, &channel, &thread_ts, answer).await
        }
        ids::EDIT_QUESTION_MODAL => {
            let question = view.input_value(round_service::QUESTION_INPUT).unwrap_or_default();
            round_service::apply_question_edit(state, user, &channel, &thread_ts, question).await
        }
        other => {
            warn!(callback_id = other, "ignoring unknown view submission");
            Ok(())
        }
    }
}

/// Tell the acting user that their explicit action failed: ephemerally where
/// a channel exists, by DM otherwise.
async fn notify_failure(
    state: &SharedState,
    channel: Option<&str>,
    user: &str,
    err: &ServiceError,
) {
    let chat = state.chat();
    let notice = err.user_notice();
    let delivery = match channel {
        Some(channel) => chat.post_ephemeral(channel, user, &notice).await,
        None => match chat.open_dm(user).await {
            Ok(dm) => chat
                .post_message(&dm, crate::chat::OutgoingMessage::text(notice))
                .await
                .map(|_| ()),
            Err(err) => Err(err),
        },
    };
    if let Err(err) = delivery {
        warn!(user, error = %err, "failed to deliver failure notice");
    }
}

/// Configure the interactivity routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/slack/interactivity", post(interactivity))
}
