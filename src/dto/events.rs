//! Inbound webhook payloads. Only the event shapes the bot reacts to are
//! modeled; everything else falls into the `Other` variants and is dropped by
//! the routes.

use serde::Deserialize;

/// Form body of a slash command invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommand {
    /// The command itself (`/puzzle`).
    #[serde(default)]
    pub command: String,
    /// Free text following the command.
    #[serde(default)]
    pub text: String,
    /// Invoking user.
    pub user_id: String,
    /// Channel the command was typed in.
    pub channel_id: String,
    /// Short-lived id for opening modals.
    #[serde(default)]
    pub trigger_id: String,
}

/// Envelope of the events webhook.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// One-time endpoint ownership handshake.
    UrlVerification {
        /// Token to echo back.
        challenge: String,
    },
    /// A subscribed workspace event.
    EventCallback {
        /// The inner event.
        event: CallbackEvent,
    },
    /// Envelope types the bot does not consume.
    #[serde(other)]
    Other,
}

/// Workspace events the bot subscribes to.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallbackEvent {
    /// A reaction was added to a message.
    ReactionAdded {
        /// Who reacted.
        user: String,
        /// Reaction name, without colons.
        reaction: String,
        /// What was reacted to.
        item: ReactionItem,
    },
    /// A message was posted.
    Message(MessageEvent),
    /// Event types the bot does not consume.
    #[serde(other)]
    Other,
}

/// Target of a reaction event.
#[derive(Debug, Deserialize)]
pub struct ReactionItem {
    /// Channel of the reacted-to message.
    pub channel: String,
    /// Timestamp of the reacted-to message.
    pub ts: String,
}

/// A posted message event.
#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    /// Author, absent for some system subtypes.
    #[serde(default)]
    pub user: Option<String>,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Channel the message was posted in.
    pub channel: String,
    /// Thread root, set for thread replies.
    #[serde(default)]
    pub thread_ts: Option<String>,
    /// Message subtype (edits, joins, bot messages); plain posts have none.
    #[serde(default)]
    pub subtype: Option<String>,
}
