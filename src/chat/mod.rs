//! Chat platform abstraction: every durable byte of bot state lives in
//! messages, so this trait is effectively the persistence layer.

pub mod blocks;
#[cfg(test)]
pub mod memory;
pub mod slack;

use std::error::Error;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chat::blocks::{Block, ModalView};

/// Result alias for chat platform operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Error raised by chat backends regardless of the underlying platform.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The platform could not be reached at all.
    #[error("chat transport failure calling `{method}`")]
    Transport {
        /// API method that was being called.
        method: String,
        /// Underlying transport error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The platform answered but rejected the call.
    #[error("chat API call `{method}` failed: {reason}")]
    Api {
        /// API method that was being called.
        method: String,
        /// Error code or message reported by the platform.
        reason: String,
    },
}

impl ChatError {
    /// Construct a transport error from any backend failure.
    pub fn transport(method: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ChatError::Transport {
            method: method.into(),
            source: Box::new(source),
        }
    }

    /// Construct an API rejection error.
    pub fn api(method: impl Into<String>, reason: impl Into<String>) -> Self {
        ChatError::Api {
            method: method.into(),
            reason: reason.into(),
        }
    }
}

/// Address of one message: the channel it lives in plus its timestamp, which
/// doubles as the message identifier on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel containing the message.
    pub channel: String,
    /// Platform-issued message timestamp (`seconds.fraction`).
    pub ts: String,
}

impl MessageRef {
    /// Build a reference from a channel and timestamp pair.
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
        }
    }
}

/// A message as read back from the platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatMessage {
    /// Platform-issued timestamp of the message.
    pub ts: String,
    /// Author user id, when the platform reports one.
    pub author: Option<String>,
    /// Raw text body.
    pub text: String,
    /// Timestamp of the thread root, for thread replies.
    pub thread_ts: Option<String>,
    /// Structured blocks attached to the message, if any.
    pub blocks: Vec<Block>,
}

/// Payload for posting or updating a message.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    /// Fallback/plain text body.
    pub text: String,
    /// Optional structured blocks.
    pub blocks: Option<Vec<Block>>,
    /// Post as a reply inside this thread.
    pub thread_ts: Option<String>,
}

impl OutgoingMessage {
    /// Plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach structured blocks.
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = Some(blocks);
        self
    }

    /// Post the message as a thread reply.
    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }
}

/// Resolved user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Platform user id.
    pub id: String,
    /// Name suitable for human-facing rendering.
    pub display_name: String,
}

/// Abstraction over the chat platform used as both notification surface and
/// record store. Mirrors the platform Web API closely enough that backends
/// stay thin.
pub trait ChatStore: Send + Sync {
    /// Post a message, returning where it landed.
    fn post_message(
        &self,
        channel: &str,
        message: OutgoingMessage,
    ) -> BoxFuture<'static, ChatResult<MessageRef>>;

    /// Overwrite an existing message in place.
    fn update_message(
        &self,
        at: &MessageRef,
        message: OutgoingMessage,
    ) -> BoxFuture<'static, ChatResult<()>>;

    /// Send an ephemeral notice only `user` can see.
    fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
    ) -> BoxFuture<'static, ChatResult<()>>;

    /// Fetch a single message, `None` when it no longer exists.
    fn get_message(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<Option<ChatMessage>>>;

    /// List a thread's messages (root first) in posting order.
    fn list_thread_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> BoxFuture<'static, ChatResult<Vec<ChatMessage>>>;

    /// List the channel's pinned messages.
    fn list_pinned(
        &self,
        channel: &str,
    ) -> BoxFuture<'static, ChatResult<Vec<(MessageRef, ChatMessage)>>>;

    /// Pin a message to its channel.
    fn pin(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<()>>;

    /// Remove a message from the channel pins.
    fn unpin(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<()>>;

    /// Open (or look up) a direct-message channel with `user`.
    fn open_dm(&self, user: &str) -> BoxFuture<'static, ChatResult<String>>;

    /// Resolve a user by id, mention token, or display name.
    fn resolve_user(&self, query: &str) -> BoxFuture<'static, ChatResult<Option<UserProfile>>>;

    /// The bot's own user id.
    fn auth_identity(&self) -> BoxFuture<'static, ChatResult<String>>;

    /// Permanent link to a message, when the platform can produce one.
    fn permalink(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<Option<String>>>;

    /// Open a modal view in response to an interaction.
    fn open_view(&self, trigger_id: &str, view: ModalView) -> BoxFuture<'static, ChatResult<()>>;
}
