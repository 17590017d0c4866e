//! Message-backed round store. Each round lives in its thread as two
//! bot-authored replies: the control message (machine-readable state) and the
//! instruction message (human-readable status). The store keeps a key-value
//! shape so the backing trick never leaks into the lifecycle layer.

use std::sync::Arc;

use tracing::debug;

use crate::chat::{ChatResult, ChatStore, MessageRef, OutgoingMessage};
use crate::round::codec::{decode_round, encode_round};
use crate::round::{Round, RoundStatus};

/// Fixed leading token of the instruction message.
const INSTRUCTION_PREFIX: &str = "Round ";

/// Store for round control and instruction messages.
pub struct RoundStore {
    chat: Arc<dyn ChatStore>,
    bot_user: String,
}

impl RoundStore {
    /// Store handle bound to the bot's own identity, which is what marks a
    /// thread reply as ours during scans.
    pub fn new(chat: Arc<dyn ChatStore>, bot_user: impl Into<String>) -> Self {
        Self {
            chat,
            bot_user: bot_user.into(),
        }
    }

    /// Locate the control message of a thread and decode its round. The first
    /// bot-authored reply that decodes wins; a thread without one has no
    /// round.
    pub async fn find(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> ChatResult<Option<(MessageRef, Round)>> {
        let replies = self.chat.list_thread_replies(channel, thread_ts).await?;
        for message in replies {
            // The root is the question itself, never the control message.
            if message.ts == thread_ts {
                continue;
            }
            if message.author.as_deref() != Some(self.bot_user.as_str()) {
                continue;
            }
            if let Some(round) = decode_round(&message.text) {
                return Ok(Some((MessageRef::new(channel, message.ts), round)));
            }
        }
        debug!(channel, thread_ts, "no control message found in thread");
        Ok(None)
    }

    /// Post a fresh control message as a thread reply.
    pub async fn insert(&self, round: &Round) -> ChatResult<MessageRef> {
        self.chat
            .post_message(
                &round.channel_id,
                OutgoingMessage::text(encode_round(round)).in_thread(round.thread_ts.clone()),
            )
            .await
    }

    /// Overwrite the control message with a freshly encoded round. This is
    /// the sole mutation path; callers read-modify-write whole records.
    pub async fn write(&self, at: &MessageRef, round: &Round) -> ChatResult<()> {
        self.chat
            .update_message(at, OutgoingMessage::text(encode_round(round)))
            .await
    }

    /// Post the instruction message for a fresh round.
    pub async fn post_instruction(&self, round: &Round) -> ChatResult<MessageRef> {
        self.chat
            .post_message(
                &round.channel_id,
                OutgoingMessage::text(instruction_text(round, None))
                    .in_thread(round.thread_ts.clone()),
            )
            .await
    }

    /// Locate the instruction message of a thread by its fixed leading token.
    pub async fn find_instruction(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> ChatResult<Option<MessageRef>> {
        let replies = self.chat.list_thread_replies(channel, thread_ts).await?;
        Ok(replies
            .into_iter()
            .find(|message| {
                message.ts != thread_ts
                    && message.author.as_deref() == Some(self.bot_user.as_str())
                    && message.text.starts_with(INSTRUCTION_PREFIX)
            })
            .map(|message| MessageRef::new(channel, message.ts)))
    }

    /// Rewrite the instruction message to match the round's current status.
    /// Missing instruction messages are tolerated: the control message is the
    /// source of truth, the instruction is presentation.
    pub async fn update_instruction(
        &self,
        round: &Round,
        solver: Option<&str>,
    ) -> ChatResult<()> {
        match self
            .find_instruction(&round.channel_id, &round.thread_ts)
            .await?
        {
            Some(at) => {
                self.chat
                    .update_message(&at, OutgoingMessage::text(instruction_text(round, solver)))
                    .await
            }
            None => {
                debug!(
                    channel = round.channel_id,
                    thread_ts = round.thread_ts,
                    "instruction message missing; skipping update"
                );
                Ok(())
            }
        }
    }
}

/// Human-readable status line kept in sync with the round.
pub fn instruction_text(round: &Round, solver: Option<&str>) -> String {
    let op = &round.op;
    match round.status {
        RoundStatus::Open => format!(
            "Round OPEN - OP: <@{op}>\n\
             Post your guesses as replies in this thread. \
             <@{op}> marks the winning guess with a reaction, \
             or answer privately from the buttons on the question."
        ),
        RoundStatus::Solved => match solver {
            Some(solver) => format!("Round SOLVED - OP: <@{op}> - Solved by: <@{solver}>"),
            None => format!("Round SOLVED - OP: <@{op}>"),
        },
        RoundStatus::Closed => format!("Round CLOSED - OP: <@{op}>"),
    }
}
