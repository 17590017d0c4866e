//! Wire DTOs for the handful of Slack Web API methods the bot calls.

use serde::Deserialize;

use crate::chat::ChatMessage;
use crate::chat::blocks::Block;

/// A message as Slack returns it inside histories, replies, and pins.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDto {
    /// Message timestamp.
    pub ts: String,
    /// Author user id, absent for some system messages.
    #[serde(default)]
    pub user: Option<String>,
    /// Raw text body.
    #[serde(default)]
    pub text: String,
    /// Thread root timestamp for replies.
    #[serde(default)]
    pub thread_ts: Option<String>,
    /// Attached layout blocks.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl From<MessageDto> for ChatMessage {
    fn from(value: MessageDto) -> Self {
        Self {
            ts: value.ts,
            author: value.user,
            text: value.text,
            thread_ts: value.thread_ts,
            blocks: value.blocks,
        }
    }
}

/// Payload of `chat.postMessage` / `chat.update`.
#[derive(Debug, Deserialize)]
pub struct PostedMessage {
    /// Timestamp assigned to the message.
    pub ts: String,
    /// Channel the message landed in.
    pub channel: String,
}

/// Payload of `conversations.replies` and `conversations.history`.
#[derive(Debug, Deserialize)]
pub struct MessageList {
    /// Matching messages.
    #[serde(default)]
    pub messages: Vec<MessageDto>,
}

/// One entry of `pins.list`.
#[derive(Debug, Deserialize)]
pub struct PinItem {
    /// Pinned message, absent for pinned files.
    #[serde(default)]
    pub message: Option<MessageDto>,
}

/// Payload of `pins.list`.
#[derive(Debug, Deserialize)]
pub struct PinList {
    /// Pinned items in the channel.
    #[serde(default)]
    pub items: Vec<PinItem>,
}

/// Payload of `auth.test`.
#[derive(Debug, Deserialize)]
pub struct AuthTest {
    /// The bot's own user id.
    pub user_id: String,
}

/// Payload of `conversations.open`.
#[derive(Debug, Deserialize)]
pub struct OpenedConversation {
    /// The opened channel.
    pub channel: ChannelIdDto,
}

/// Minimal channel object.
#[derive(Debug, Deserialize)]
pub struct ChannelIdDto {
    /// Channel id.
    pub id: String,
}

/// Payload of `users.info` / entries of `users.list`.
#[derive(Debug, Deserialize)]
pub struct UserDto {
    /// User id.
    pub id: String,
    /// Account name.
    #[serde(default)]
    pub name: String,
    /// Profile fields.
    #[serde(default)]
    pub profile: UserProfileDto,
}

/// Profile fields of a user object.
#[derive(Debug, Default, Deserialize)]
pub struct UserProfileDto {
    /// Display name, often empty.
    #[serde(default)]
    pub display_name: String,
    /// Full real name.
    #[serde(default)]
    pub real_name: String,
}

impl UserDto {
    /// Best human-facing name the profile offers.
    pub fn best_name(&self) -> String {
        [
            &self.profile.display_name,
            &self.profile.real_name,
            &self.name,
        ]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .cloned()
        .unwrap_or_else(|| self.id.clone())
    }
}

/// Payload of `users.info`.
#[derive(Debug, Deserialize)]
pub struct UserInfo {
    /// The resolved user.
    pub user: UserDto,
}

/// Payload of `users.list`.
#[derive(Debug, Deserialize)]
pub struct UserList {
    /// Workspace members (first page).
    #[serde(default)]
    pub members: Vec<UserDto>,
}

/// Payload of `chat.getPermalink`.
#[derive(Debug, Deserialize)]
pub struct Permalink {
    /// Permanent URL of the message.
    pub permalink: String,
}
