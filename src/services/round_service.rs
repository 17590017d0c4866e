//! Round lifecycle: creation, the reaction-based solve trigger, private
//! answers, question edits, closing, and the post-solve guess nudge.
//!
//! Explicit actions (buttons, commands) surface authorization and state
//! errors to the user; the implicit detection paths (reactions, ambient
//! thread messages) drop their guards silently, logging only.

use tracing::{debug, info, warn};

use crate::chat::blocks::{Block, ButtonElement, InputElement, ModalView, TextObject, actions, section};
use crate::chat::{MessageRef, OutgoingMessage};
use crate::dto::actions::ids;
use crate::error::ServiceError;
use crate::round::codec::encode_thread_ref;
use crate::round::{Round, RoundStatus};
use crate::scoreboard::year_of_thread;
use crate::services::confirm_service;
use crate::state::SharedState;

/// Block and input ids of the question edit modal.
pub const QUESTION_INPUT: &str = "question_input";
/// Block and input ids of the private answer modal.
pub const ANSWER_INPUT: &str = "answer_input";

/// Start a round: post the question with its action buttons, then seed the
/// thread with the control and instruction messages, and count the question
/// toward the OP's tally for the thread's year.
pub async fn start_round(
    state: &SharedState,
    channel: &str,
    op: &str,
    question: &str,
) -> Result<(), ServiceError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ServiceError::InvalidInput(
            "A round needs a question. Try `/puzzle <your question>`.".into(),
        ));
    }

    let chat = state.chat();
    // The buttons carry the thread reference, which only exists once the
    // question message is posted; post first, then attach the controls.
    let root = chat
        .post_message(channel, OutgoingMessage::text(question))
        .await?;
    let round = Round::open(op, channel, root.ts.clone(), question);
    chat.update_message(
        &root,
        OutgoingMessage::text(question).with_blocks(question_blocks(&round, question)),
    )
    .await?;

    let rounds = state.rounds().await?;
    rounds.insert(&round).await?;
    rounds.post_instruction(&round).await?;

    let year = thread_year(&round)?;
    state
        .scoreboard()
        .update(channel, |data| {
            data.add_question(op, year);
            Ok(())
        })
        .await?;
    info!(channel, thread_ts = root.ts, op, "round started");
    Ok(())
}

/// Interpret an added reaction as a solve trigger when every guard passes:
/// the affirmative emoji, an open round, the reactor is the OP, the reacted
/// message is neither the bot's nor (outside the test channel) the OP's own.
/// Guard violations are silent no-ops.
pub async fn handle_reaction(
    state: &SharedState,
    reactor: &str,
    reaction: &str,
    channel: &str,
    ts: &str,
) -> Result<(), ServiceError> {
    if reaction != state.config().confirm_emoji {
        return Ok(());
    }
    let chat = state.chat();
    let bot_user = state.bot_user_id().await?.to_owned();
    let Some(message) = chat.get_message(&MessageRef::new(channel, ts)).await? else {
        debug!(channel, ts, "reacted message is gone");
        return Ok(());
    };
    let thread_root = message.thread_ts.clone().unwrap_or_else(|| message.ts.clone());

    let rounds = state.rounds().await?;
    let Some((control, round)) = rounds.find(channel, &thread_root).await? else {
        debug!(channel, thread_root, "reaction outside a round thread");
        return Ok(());
    };
    if round.status != RoundStatus::Open {
        debug!(channel, thread_root, status = %round.status, "round is settled");
        return Ok(());
    }
    if reactor != round.op {
        debug!(channel, thread_root, reactor, "reactor is not the OP");
        return Ok(());
    }
    let Some(author) = message.author.clone() else {
        debug!(channel, ts, "reacted message has no author");
        return Ok(());
    };
    if author == bot_user {
        debug!(channel, ts, "ignoring reaction on the bot's own message");
        return Ok(());
    }
    if author == round.op && !state.is_test_channel(channel) {
        debug!(channel, ts, "OP reacted to their own message outside the test channel");
        return Ok(());
    }

    confirm_service::request_confirmation(state, &round, &control, &author, &message.text, false)
        .await
}

/// Open the private-answer modal for a non-OP user.
pub async fn open_private_answer_modal(
    state: &SharedState,
    channel: &str,
    thread_ts: &str,
    actor: &str,
    trigger_id: &str,
) -> Result<(), ServiceError> {
    let (_, round) = require_round(state, channel, thread_ts).await?;
    require_open(&round)?;
    if actor == round.op {
        return Err(ServiceError::Unauthorized(
            "You posted this round, so you cannot answer it.".into(),
        ));
    }

    let view = ModalView::new(ids::PRIVATE_ANSWER_MODAL, "Answer privately")
        .private_metadata(encode_thread_ref(channel, thread_ts))
        .block(Block::Input {
            block_id: Some(ANSWER_INPUT.into()),
            label: TextObject::plain("Your answer"),
            element: InputElement::new(ANSWER_INPUT).multiline(),
        });
    state.chat().open_view(trigger_id, view).await?;
    Ok(())
}

/// Handle a submitted private answer: same confirmation handshake as the
/// public path, with the submitter as the credited identity.
pub async fn submit_private_answer(
    state: &SharedState,
    actor: &str,
    channel: &str,
    thread_ts: &str,
    answer: &str,
) -> Result<(), ServiceError> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(ServiceError::InvalidInput("An answer cannot be empty.".into()));
    }
    let (control, round) = require_round(state, channel, thread_ts).await?;
    require_open(&round)?;
    if actor == round.op {
        return Err(ServiceError::Unauthorized(
            "You posted this round, so you cannot answer it.".into(),
        ));
    }
    confirm_service::request_confirmation(state, &round, &control, actor, answer, true).await
}

/// Open the question-edit modal. OP only, open rounds only.
pub async fn open_edit_modal(
    state: &SharedState,
    channel: &str,
    thread_ts: &str,
    actor: &str,
    trigger_id: &str,
) -> Result<(), ServiceError> {
    let (_, round) = require_round(state, channel, thread_ts).await?;
    require_op(&round, actor, "edit the question")?;
    require_open(&round)?;

    let current = question_text(state, &round).await;
    let view = ModalView::new(ids::EDIT_QUESTION_MODAL, "Edit question")
        .private_metadata(encode_thread_ref(channel, thread_ts))
        .block(Block::Input {
            block_id: Some(QUESTION_INPUT.into()),
            label: TextObject::plain("Question"),
            element: InputElement::new(QUESTION_INPUT)
                .initial_value(current)
                .multiline(),
        });
    state.chat().open_view(trigger_id, view).await?;
    Ok(())
}

/// Apply an edited question: rewrite the stored text and the public message,
/// and leave a notice in the thread.
pub async fn apply_question_edit(
    state: &SharedState,
    actor: &str,
    channel: &str,
    thread_ts: &str,
    question: &str,
) -> Result<(), ServiceError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ServiceError::InvalidInput("A question cannot be empty.".into()));
    }
    let rounds = state.rounds().await?;
    let (control, mut round) = require_round(state, channel, thread_ts).await?;
    require_op(&round, actor, "edit the question")?;
    require_open(&round)?;

    round.question = Some(question.to_owned());
    rounds.write(&control, &round).await?;
    refresh_question_message(state, &round).await?;
    if let Err(err) = state
        .chat()
        .post_message(
            channel,
            OutgoingMessage::text("The OP edited the question.").in_thread(thread_ts.to_owned()),
        )
        .await
    {
        warn!(error = %err, "failed to post edit notice");
    }
    info!(channel, thread_ts, "question edited");
    Ok(())
}

/// Close a round. OP only, open rounds only. Closing reverses the
/// question-count increment from creation: an unsolved, closed round does not
/// count as asked.
pub async fn close_round(
    state: &SharedState,
    channel: &str,
    thread_ts: &str,
    actor: &str,
) -> Result<(), ServiceError> {
    let rounds = state.rounds().await?;
    let (control, mut round) = require_round(state, channel, thread_ts).await?;
    require_op(&round, actor, "close this round")?;

    round.close()?;
    rounds.write(&control, &round).await?;

    let year = thread_year(&round)?;
    let op = round.op.clone();
    state
        .scoreboard()
        .update(channel, |data| {
            data.remove_question(&op, year);
            Ok(())
        })
        .await?;

    if let Err(err) = refresh_question_message(state, &round).await {
        warn!(error = %err, "failed to update question message on close");
    }
    if let Err(err) = rounds.update_instruction(&round, None).await {
        warn!(error = %err, "failed to update instruction message on close");
    }
    info!(channel, thread_ts, "round closed");
    Ok(())
}

/// Answer text for the "view answer" button on a solved round.
pub async fn view_answer(
    state: &SharedState,
    channel: &str,
    thread_ts: &str,
) -> Result<String, ServiceError> {
    let (_, round) = require_round(state, channel, thread_ts).await?;
    match (round.status, round.answer) {
        (RoundStatus::Solved, Some(answer)) => Ok(format!("The accepted answer was:\n>{answer}")),
        (RoundStatus::Closed, _) => Err(ServiceError::InvalidState(
            "This round was closed without a solve.".into(),
        )),
        _ => Err(ServiceError::InvalidState(
            "This round has not been solved yet.".into(),
        )),
    }
}

/// Nudge people who keep guessing in a thread whose round is already solved.
/// No-op in every other case.
pub async fn handle_thread_message(
    state: &SharedState,
    channel: &str,
    author: Option<&str>,
    text: &str,
    thread_ts: Option<&str>,
) -> Result<(), ServiceError> {
    let Some(thread_root) = thread_ts else {
        return Ok(());
    };
    let Some(author) = author else {
        return Ok(());
    };
    if author == state.bot_user_id().await? {
        return Ok(());
    }
    if !state.guesses().looks_like_guess(text) {
        return Ok(());
    }
    let rounds = state.rounds().await?;
    let Some((_, round)) = rounds.find(channel, thread_root).await? else {
        debug!(channel, thread_root, "guess-like message outside a round");
        return Ok(());
    };
    if round.status != RoundStatus::Solved {
        return Ok(());
    }
    state
        .chat()
        .post_message(
            channel,
            OutgoingMessage::text(
                "Heads up: this round has already been solved. Watch for the next one!",
            )
            .in_thread(thread_root.to_owned()),
        )
        .await?;
    Ok(())
}

/// Rewrite the public question message to match the round's current status.
pub(crate) async fn refresh_question_message(
    state: &SharedState,
    round: &Round,
) -> Result<(), ServiceError> {
    let question = question_text(state, round).await;
    let root = MessageRef::new(round.channel_id.clone(), round.thread_ts.clone());
    state
        .chat()
        .update_message(
            &root,
            OutgoingMessage::text(question.clone()).with_blocks(question_blocks(round, &question)),
        )
        .await?;
    Ok(())
}

/// The round's question, reading the root message for records predating the
/// stored question field.
async fn question_text(state: &SharedState, round: &Round) -> String {
    if let Some(question) = &round.question {
        return question.clone();
    }
    let root = MessageRef::new(round.channel_id.clone(), round.thread_ts.clone());
    match state.chat().get_message(&root).await {
        Ok(Some(message)) => message.text,
        Ok(None) => String::new(),
        Err(err) => {
            warn!(error = %err, "failed to read question from root message");
            String::new()
        }
    }
}

/// Blocks of the public question message for each lifecycle state.
fn question_blocks(round: &Round, question: &str) -> Vec<Block> {
    let op = &round.op;
    let thread_ref = encode_thread_ref(&round.channel_id, &round.thread_ts);
    match round.status {
        RoundStatus::Open => vec![
            section(format!("*Puzzle from <@{op}>*\n{question}")),
            actions(vec![
                ButtonElement::new(ids::SUBMIT_PRIVATE_ANSWER, "Answer privately")
                    .value(thread_ref.clone()),
                ButtonElement::new(ids::EDIT_QUESTION, "Edit question").value(thread_ref.clone()),
                ButtonElement::new(ids::CLOSE_ROUND, "Close round").value(thread_ref),
            ]),
        ],
        RoundStatus::Solved => vec![
            section(format!("*Puzzle from <@{op}>* (solved)\n{question}")),
            actions(vec![
                ButtonElement::new(ids::VIEW_ANSWER, "View answer").value(thread_ref),
            ]),
        ],
        RoundStatus::Closed => vec![section(format!(
            "*Puzzle from <@{op}>* (closed)\n{question}"
        ))],
    }
}

async fn require_round(
    state: &SharedState,
    channel: &str,
    thread_ts: &str,
) -> Result<(MessageRef, Round), ServiceError> {
    let rounds = state.rounds().await?;
    rounds
        .find(channel, thread_ts)
        .await?
        .ok_or_else(|| ServiceError::NotFound("No round found in this thread.".into()))
}

fn require_op(round: &Round, actor: &str, action: &str) -> Result<(), ServiceError> {
    if actor == round.op {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(format!(
            "Only the OP can {action}."
        )))
    }
}

fn require_open(round: &Round) -> Result<(), ServiceError> {
    if round.status == RoundStatus::Open {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "This round is already {}.",
            round.status
        )))
    }
}

fn thread_year(round: &Round) -> Result<i32, ServiceError> {
    year_of_thread(&round.thread_ts).ok_or_else(|| {
        ServiceError::InvalidState(format!("unreadable thread timestamp {}", round.thread_ts))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::blocks::Block;
    use crate::chat::memory::MemoryChat;
    use crate::services::confirm_service::SolvePayload;
    use crate::services::testutil::test_state;

    /// A moment inside 2025.
    const YEAR_2025: i64 = 1_750_000_000;
    /// A moment inside 2020.
    const YEAR_2020: i64 = 1_600_000_000;

    fn button_payload(blocks: &[Block], action_id: &str) -> SolvePayload {
        for block in blocks {
            if let Block::Actions { elements, .. } = block {
                for element in elements {
                    if element.action_id == action_id {
                        let value = element.value.as_deref().expect("button has a value");
                        return SolvePayload::decode(value).expect("payload decodes");
                    }
                }
            }
        }
        panic!("no {action_id} button found");
    }

    async fn started_round(chat: &MemoryChat, state: &crate::state::SharedState) -> String {
        start_round(state, "C1", "U1", "What has keys but no locks?")
            .await
            .unwrap();
        chat.channel_messages("C1")[0].ts.clone()
    }

    #[tokio::test]
    async fn full_solve_flow_awards_exactly_one_point() {
        let chat = MemoryChat::new(YEAR_2025);
        chat.add_user("U1", "Anna");
        chat.add_user("U2", "Bob");
        let state = test_state(&chat);

        let root_ts = started_round(&chat, &state).await;
        assert_eq!(state.scoreboard().load("C1").await.questions("U1", 2025), 1);

        let guess = chat.post_as("U2", "C1", "guess: a piano", Some(&root_ts));
        handle_reaction(&state, "U1", "white_check_mark", "C1", &guess.ts)
            .await
            .unwrap();

        // The OP got a DM prompt with Yes/No buttons.
        let prompts = chat.channel_messages("DU1");
        assert_eq!(prompts.len(), 1);
        let payload = button_payload(&prompts[0].blocks, ids::CONFIRM_SOLVE);
        assert_eq!(payload.winner, "U2");
        assert_eq!(payload.answer, "guess: a piano");

        crate::services::confirm_service::confirm(&state, payload.clone())
            .await
            .unwrap();

        let (_, round) = state
            .rounds()
            .await
            .unwrap()
            .find("C1", &root_ts)
            .await
            .unwrap()
            .expect("round present");
        assert_eq!(round.status, RoundStatus::Solved);
        assert_eq!(round.answer.as_deref(), Some("guess: a piano"));

        let board = state.scoreboard().load("C1").await;
        assert_eq!(board.score("U2", 2025), 1);

        let texts: Vec<String> = chat
            .channel_messages("C1")
            .iter()
            .map(|m| m.text.clone())
            .collect();
        assert!(texts.iter().any(|t| t == "Solved. Point goes to <@U2>."));
        // Winner got a congratulations DM.
        assert!(
            chat.channel_messages("DU2")
                .iter()
                .any(|m| m.text.contains("Congratulations"))
        );
        // The DM prompt was settled in place.
        assert!(chat.channel_messages("DU1")[0].text.starts_with("Confirmed"));
    }

    #[tokio::test]
    async fn point_lands_in_the_year_the_round_was_asked() {
        let chat = MemoryChat::new(YEAR_2020);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;
        let guess = chat.post_as("U2", "C1", "is it a piano?", Some(&root_ts));

        // The confirm happens much later.
        chat.set_clock(YEAR_2025);
        handle_reaction(&state, "U1", "white_check_mark", "C1", &guess.ts)
            .await
            .unwrap();
        let payload = button_payload(&chat.channel_messages("DU1")[0].blocks, ids::CONFIRM_SOLVE);
        crate::services::confirm_service::confirm(&state, payload).await.unwrap();

        let board = state.scoreboard().load("C1").await;
        assert_eq!(board.score("U2", 2020), 1);
        assert_eq!(board.score("U2", 2025), 0);
        assert_eq!(board.questions("U1", 2020), 1);
    }

    #[tokio::test]
    async fn second_confirm_is_a_no_op_and_scores_once() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;

        let first = chat.post_as("U2", "C1", "guess: one", Some(&root_ts));
        let second = chat.post_as("U3", "C1", "guess: two", Some(&root_ts));
        handle_reaction(&state, "U1", "white_check_mark", "C1", &first.ts)
            .await
            .unwrap();
        handle_reaction(&state, "U1", "white_check_mark", "C1", &second.ts)
            .await
            .unwrap();

        let prompts = chat.channel_messages("DU1");
        assert_eq!(prompts.len(), 2, "both triggers open a prompt while open");
        let first_payload = button_payload(&prompts[0].blocks, ids::CONFIRM_SOLVE);
        let second_payload = button_payload(&prompts[1].blocks, ids::CONFIRM_SOLVE);

        crate::services::confirm_service::confirm(&state, first_payload)
            .await
            .unwrap();
        crate::services::confirm_service::confirm(&state, second_payload)
            .await
            .unwrap();

        let board = state.scoreboard().load("C1").await;
        assert_eq!(board.score("U2", 2025), 1);
        assert_eq!(board.score("U3", 2025), 0, "second confirm must not score");
        assert!(
            chat.channel_messages("DU1")[1]
                .text
                .contains("already SOLVED")
        );
    }

    #[tokio::test]
    async fn op_self_reaction_is_ignored_outside_the_test_channel() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;

        let own = chat.post_as("U1", "C1", "guess: self", Some(&root_ts));
        handle_reaction(&state, "U1", "white_check_mark", "C1", &own.ts)
            .await
            .unwrap();
        assert!(chat.channel_messages("DU1").is_empty(), "no prompt expected");
    }

    #[tokio::test]
    async fn op_self_reaction_is_honored_in_the_test_channel() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        start_round(&state, "CTEST", "U1", "Self test?").await.unwrap();
        let root_ts = chat.channel_messages("CTEST")[0].ts.clone();

        let own = chat.post_as("U1", "CTEST", "guess: self", Some(&root_ts));
        handle_reaction(&state, "U1", "white_check_mark", "CTEST", &own.ts)
            .await
            .unwrap();
        assert_eq!(chat.channel_messages("DU1").len(), 1);
    }

    #[tokio::test]
    async fn non_op_reaction_and_wrong_emoji_are_silent() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;
        let guess = chat.post_as("U2", "C1", "guess: a piano", Some(&root_ts));

        handle_reaction(&state, "U3", "white_check_mark", "C1", &guess.ts)
            .await
            .unwrap();
        handle_reaction(&state, "U1", "thumbsup", "C1", &guess.ts)
            .await
            .unwrap();
        assert!(chat.channel_messages("DU1").is_empty());
        assert!(chat.channel_messages("DU3").is_empty());
    }

    #[tokio::test]
    async fn closing_reverses_the_question_count_and_is_terminal() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;
        assert_eq!(state.scoreboard().load("C1").await.questions("U1", 2025), 1);

        // Only the OP may close.
        let err = close_round(&state, "C1", &root_ts, "U2").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        close_round(&state, "C1", &root_ts, "U1").await.unwrap();
        let board = state.scoreboard().load("C1").await;
        assert_eq!(board.questions("U1", 2025), 0);
        assert!(board.questions_by_year.is_empty(), "zero entries are pruned");

        let err = close_round(&state, "C1", &root_ts, "U1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)), "{err:?}");
    }

    #[tokio::test]
    async fn private_answer_runs_the_same_handshake() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;

        submit_private_answer(&state, "U2", "C1", &root_ts, "a piano")
            .await
            .unwrap();
        let prompts = chat.channel_messages("DU1");
        assert_eq!(prompts.len(), 1);
        let payload = button_payload(&prompts[0].blocks, ids::CONFIRM_PRIVATE_SOLVE);
        assert!(payload.private);

        crate::services::confirm_service::cancel(&state, payload).await.unwrap();
        // Submitter is told their answer was declined.
        assert!(
            chat.channel_messages("DU2")
                .iter()
                .any(|m| m.text.contains("not accepted"))
        );
        // Round stays open, nothing scored.
        let (_, round) = state
            .rounds()
            .await
            .unwrap()
            .find("C1", &root_ts)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(round.status, RoundStatus::Open);
        assert_eq!(state.scoreboard().load("C1").await.score("U2", 2025), 0);
    }

    #[tokio::test]
    async fn op_cannot_answer_privately() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;
        let err = submit_private_answer(&state, "U1", "C1", &root_ts, "mine")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn editing_rewrites_question_and_is_op_only() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;

        let err = apply_question_edit(&state, "U2", "C1", &root_ts, "hijacked")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        apply_question_edit(&state, "U1", "C1", &root_ts, "What can travel around the world in a corner?")
            .await
            .unwrap();
        let (_, round) = state
            .rounds()
            .await
            .unwrap()
            .find("C1", &root_ts)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            round.question.as_deref(),
            Some("What can travel around the world in a corner?")
        );
        // Public message carries the new text; a notice landed in the thread.
        assert_eq!(
            chat.channel_messages("C1")[0].text,
            "What can travel around the world in a corner?"
        );
        assert!(
            chat.channel_messages("C1")
                .iter()
                .any(|m| m.text == "The OP edited the question.")
        );
    }

    #[tokio::test]
    async fn guess_after_solve_gets_a_nudge() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;
        let guess = chat.post_as("U2", "C1", "guess: a piano", Some(&root_ts));
        handle_reaction(&state, "U1", "white_check_mark", "C1", &guess.ts)
            .await
            .unwrap();
        let payload = button_payload(&chat.channel_messages("DU1")[0].blocks, ids::CONFIRM_SOLVE);
        crate::services::confirm_service::confirm(&state, payload).await.unwrap();

        let before = chat.channel_messages("C1").len();
        handle_thread_message(&state, "C1", Some("U3"), "my guess is a harp", Some(&root_ts))
            .await
            .unwrap();
        let messages = chat.channel_messages("C1");
        assert_eq!(messages.len(), before + 1);
        assert!(messages.last().unwrap().text.contains("already been solved"));

        // Non-guess chatter and guesses in unknown threads stay silent.
        handle_thread_message(&state, "C1", Some("U3"), "nice one!", Some(&root_ts))
            .await
            .unwrap();
        handle_thread_message(&state, "C1", Some("U3"), "guess: x", Some("9.000009"))
            .await
            .unwrap();
        assert_eq!(chat.channel_messages("C1").len(), before + 1);
    }

    #[tokio::test]
    async fn view_answer_requires_a_solved_round() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;

        let err = view_answer(&state, "C1", &root_ts).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let guess = chat.post_as("U2", "C1", "guess: a piano", Some(&root_ts));
        handle_reaction(&state, "U1", "white_check_mark", "C1", &guess.ts)
            .await
            .unwrap();
        let payload = button_payload(&chat.channel_messages("DU1")[0].blocks, ids::CONFIRM_SOLVE);
        crate::services::confirm_service::confirm(&state, payload).await.unwrap();

        let text = view_answer(&state, "C1", &root_ts).await.unwrap();
        assert!(text.contains("guess: a piano"));
    }

    #[tokio::test]
    async fn private_answer_modal_carries_the_round_reference() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let root_ts = started_round(&chat, &state).await;

        open_private_answer_modal(&state, "C1", &root_ts, "U2", "trig1")
            .await
            .unwrap();
        let views = chat.views();
        assert_eq!(views.len(), 1);
        let (trigger_id, view) = &views[0];
        assert_eq!(trigger_id, "trig1");
        assert_eq!(view.callback_id, ids::PRIVATE_ANSWER_MODAL);
        assert_eq!(
            crate::round::codec::decode_thread_ref(&view.private_metadata),
            Some(("C1".into(), root_ts.clone()))
        );
    }

    #[tokio::test]
    async fn starting_requires_a_question() {
        let chat = MemoryChat::new(YEAR_2025);
        let state = test_state(&chat);
        let err = start_round(&state, "C1", "U1", "   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(chat.channel_messages("C1").is_empty());
    }
}
