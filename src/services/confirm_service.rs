//! The two-party solve confirmation handshake: a Yes/No prompt DMed to the
//! OP, with the full context serialized into both buttons so either press can
//! settle the flow and update the DM in place. Pressing a button re-reads the
//! round first; a round settled in the meantime turns both buttons into
//! no-ops that only refresh the DM.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chat::blocks::{ButtonElement, actions, section};
use crate::chat::{MessageRef, OutgoingMessage};
use crate::dto::actions::ids;
use crate::error::ServiceError;
use crate::round::{Round, RoundStatus};
use crate::scoreboard::year_of_thread;
use crate::services::round_service;
use crate::state::SharedState;

/// Context threaded through the confirmation buttons. Self-describing: both
/// buttons carry the whole payload, so the handler needs nothing but a fresh
/// read of the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvePayload {
    /// Channel of the round.
    pub channel: String,
    /// Thread anchoring the round.
    pub thread_ts: String,
    /// Identity credited on confirm.
    pub winner: String,
    /// Location of the round's control message.
    pub control: MessageRef,
    /// Accepted answer text.
    pub answer: String,
    /// DM channel holding the prompt.
    pub dm_channel: String,
    /// Timestamp of the prompt message, so it can be updated in place.
    pub dm_ts: String,
    /// Whether this came through the private-answer path.
    #[serde(default)]
    pub private: bool,
}

impl SolvePayload {
    /// Serialize for embedding in a button value.
    pub fn encode(&self) -> String {
        // Serializing a plain struct cannot fail.
        let json = serde_json::to_vec(self).expect("payload serializes");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Reverse of [`Self::encode`].
    pub fn decode(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Open the confirmation prompt: DM the OP a Yes/No question about the
/// candidate answer. The prompt is posted first and then updated with the
/// buttons, so the payload can carry the prompt's own location.
pub async fn request_confirmation(
    state: &SharedState,
    round: &Round,
    control: &MessageRef,
    winner: &str,
    answer: &str,
    private: bool,
) -> Result<(), ServiceError> {
    let chat = state.chat();
    let dm_channel = chat.open_dm(&round.op).await?;
    let prompt = chat
        .post_message(&dm_channel, OutgoingMessage::text("Confirm solve?"))
        .await?;

    let payload = SolvePayload {
        channel: round.channel_id.clone(),
        thread_ts: round.thread_ts.clone(),
        winner: winner.to_owned(),
        control: control.clone(),
        answer: answer.to_owned(),
        dm_channel: dm_channel.clone(),
        dm_ts: prompt.ts.clone(),
        private,
    };
    let (confirm_id, cancel_id) = if private {
        (ids::CONFIRM_PRIVATE_SOLVE, ids::CANCEL_PRIVATE_SOLVE)
    } else {
        (ids::CONFIRM_SOLVE, ids::CANCEL_SOLVE)
    };
    let verb = if private { "answered privately" } else { "guessed" };
    let blocks = vec![
        section(format!(
            "<@{winner}> {verb}:\n>{answer}\nMark this as the correct answer?"
        )),
        actions(vec![
            ButtonElement::new(confirm_id, "Yes")
                .value(payload.encode())
                .style("primary"),
            ButtonElement::new(cancel_id, "No")
                .value(payload.encode())
                .style("danger"),
        ]),
    ];
    chat.update_message(
        &prompt,
        OutgoingMessage::text("Confirm solve?").with_blocks(blocks),
    )
    .await?;
    Ok(())
}

/// Handle a press of the Yes button: settle the round, award the point, and
/// fan out the notifications. Re-reads the round first so a stale press on an
/// already-settled round changes nothing.
pub async fn confirm(state: &SharedState, payload: SolvePayload) -> Result<(), ServiceError> {
    let rounds = state.rounds().await?;
    let Some((control, mut round)) = rounds.find(&payload.channel, &payload.thread_ts).await?
    else {
        settle_prompt(state, &payload, "No changes made: that round no longer exists.").await;
        return Ok(());
    };
    if round.is_settled() {
        settle_prompt(
            state,
            &payload,
            &format!("No changes made: this round is already {}.", round.status),
        )
        .await;
        return Ok(());
    }

    let year = year_of_thread(&round.thread_ts).ok_or_else(|| {
        ServiceError::InvalidState(format!("unreadable thread timestamp {}", round.thread_ts))
    })?;

    round.solve(payload.answer.clone())?;
    rounds.write(&control, &round).await?;
    state
        .scoreboard()
        .update(&round.channel_id, |data| {
            data.add_points(&payload.winner, year, 1).map(|_| ())
        })
        .await?;
    info!(
        channel = round.channel_id,
        thread_ts = round.thread_ts,
        winner = payload.winner,
        year,
        "round solved"
    );

    // The state and the score are committed; everything from here is
    // best-effort notification.
    let chat = state.chat();
    let winner = payload.winner.clone();
    if let Err(err) = chat
        .post_message(
            &round.channel_id,
            OutgoingMessage::text(format!("Solved. Point goes to <@{winner}>."))
                .in_thread(round.thread_ts.clone()),
        )
        .await
    {
        warn!(error = %err, "failed to post solved notice");
    }
    if let Err(err) = round_service::refresh_question_message(state, &round).await {
        warn!(error = %err, "failed to swap question message to solved state");
    }
    if let Err(err) = rounds.update_instruction(&round, Some(&winner)).await {
        warn!(error = %err, "failed to update instruction message");
    }
    settle_prompt(
        state,
        &payload,
        &format!("Confirmed. Point goes to <@{winner}>."),
    )
    .await;
    congratulate_winner(state, &payload, year).await;
    Ok(())
}

/// Handle a press of the No button: refresh the DM and, for the private
/// variant, tell the submitter their answer was not accepted.
pub async fn cancel(state: &SharedState, payload: SolvePayload) -> Result<(), ServiceError> {
    let rounds = state.rounds().await?;
    let settled_status = rounds
        .find(&payload.channel, &payload.thread_ts)
        .await?
        .map(|(_, round)| round.status)
        .filter(|status| *status != RoundStatus::Open);

    if let Some(status) = settled_status {
        settle_prompt(
            state,
            &payload,
            &format!("No changes made: this round is already {status}."),
        )
        .await;
        return Ok(());
    }

    settle_prompt(state, &payload, "Cancelled. No point awarded.").await;
    if payload.private {
        notify_submitter_declined(state, &payload).await;
    }
    Ok(())
}

/// Rewrite the DM prompt in place, dropping the buttons. Best-effort.
async fn settle_prompt(state: &SharedState, payload: &SolvePayload, text: &str) {
    let at = MessageRef::new(payload.dm_channel.clone(), payload.dm_ts.clone());
    if let Err(err) = state
        .chat()
        .update_message(&at, OutgoingMessage::text(text))
        .await
    {
        warn!(error = %err, "failed to update confirmation prompt");
    }
}

/// DM the winner a private congratulation. Best-effort.
async fn congratulate_winner(state: &SharedState, payload: &SolvePayload, year: i32) {
    let chat = state.chat();
    let result = async {
        let dm = chat.open_dm(&payload.winner).await?;
        chat.post_message(
            &dm,
            OutgoingMessage::text(format!(
                "Congratulations, your answer was accepted!\n>{}\nOne point for {year} is on the board.",
                payload.answer
            )),
        )
        .await
    }
    .await;
    if let Err(err) = result {
        warn!(winner = payload.winner, error = %err, "failed to send congratulations");
    }
}

/// DM the private-answer submitter that the OP declined. Best-effort.
async fn notify_submitter_declined(state: &SharedState, payload: &SolvePayload) {
    let chat = state.chat();
    let result = async {
        let dm = chat.open_dm(&payload.winner).await?;
        chat.post_message(
            &dm,
            OutgoingMessage::text(
                "Your private answer was not accepted this time. Keep guessing!",
            ),
        )
        .await
    }
    .await;
    if let Err(err) = result {
        warn!(submitter = payload.winner, error = %err, "failed to notify submitter");
    }
}
