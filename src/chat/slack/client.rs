//! Thin `reqwest` client for the Slack Web API methods the bot needs.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::chat::blocks::ModalView;
use crate::chat::{
    ChatError, ChatMessage, ChatResult, ChatStore, MessageRef, OutgoingMessage, UserProfile,
};

use super::SlackConfig;
use super::models::{
    AuthTest, MessageList, OpenedConversation, Permalink, PinList, PostedMessage, UserInfo,
    UserList,
};

/// [`ChatStore`] backend speaking to the Slack Web API.
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    base_url: Arc<str>,
    token: Arc<str>,
}

impl SlackClient {
    /// Build a client from connection settings.
    pub fn new(config: SlackConfig) -> ChatResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ChatError::transport("client_builder", source))?;
        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            token: Arc::from(config.token.as_str()),
        })
    }

    async fn call<T>(&self, method: &'static str, payload: serde_json::Value) -> ChatResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.as_ref())
            .json(&payload)
            .send()
            .await
            .map_err(|source| ChatError::transport(method, source))?;
        Self::unwrap_envelope(method, response).await
    }

    async fn get<T>(&self, method: &'static str, query: &[(&str, &str)]) -> ChatResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.as_ref())
            .query(query)
            .send()
            .await
            .map_err(|source| ChatError::transport(method, source))?;
        Self::unwrap_envelope(method, response).await
    }

    /// Every Web API response is `{ "ok": bool, "error": code, ...payload }`;
    /// check the flag first, then decode the payload from the same object.
    async fn unwrap_envelope<T>(method: &'static str, response: reqwest::Response) -> ChatResult<T>
    where
        T: DeserializeOwned,
    {
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|source| ChatError::transport(method, source))?;
        if !value.get("ok").and_then(serde_json::Value::as_bool).unwrap_or(false) {
            let reason = value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown_error")
                .to_owned();
            return Err(ChatError::api(method, reason));
        }
        serde_json::from_value(value)
            .map_err(|source| ChatError::api(method, format!("malformed response: {source}")))
    }

    /// Variant of [`Self::call`] for methods whose payload we do not consume.
    async fn call_ok(&self, method: &'static str, payload: serde_json::Value) -> ChatResult<()> {
        let _: serde_json::Value = self.call(method, payload).await?;
        Ok(())
    }

    fn message_payload(channel: &str, message: &OutgoingMessage) -> serde_json::Value {
        let mut payload = json!({
            "channel": channel,
            "text": message.text,
        });
        if let Some(blocks) = &message.blocks {
            payload["blocks"] = serde_json::to_value(blocks).unwrap_or_default();
        }
        if let Some(thread_ts) = &message.thread_ts {
            payload["thread_ts"] = json!(thread_ts);
        }
        payload
    }

    /// Strip `<@U123|name>` mention syntax down to the bare id.
    fn bare_user_token(query: &str) -> &str {
        let trimmed = query.trim();
        let trimmed = trimmed
            .strip_prefix("<@")
            .and_then(|rest| rest.strip_suffix('>'))
            .unwrap_or(trimmed);
        trimmed.split('|').next().unwrap_or(trimmed).trim_start_matches('@')
    }

    fn looks_like_user_id(token: &str) -> bool {
        (token.starts_with('U') || token.starts_with('W'))
            && token.len() > 1
            && token.chars().all(|c| c.is_ascii_alphanumeric())
            && token.chars().all(|c| !c.is_ascii_lowercase())
    }

    async fn user_by_id(&self, id: &str) -> ChatResult<Option<UserProfile>> {
        match self.get::<UserInfo>("users.info", &[("user", id)]).await {
            Ok(info) => Ok(Some(UserProfile {
                display_name: info.user.best_name(),
                id: info.user.id,
            })),
            Err(ChatError::Api { reason, .. }) if reason == "user_not_found" => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn user_by_name(&self, name: &str) -> ChatResult<Option<UserProfile>> {
        let list: UserList = self.get("users.list", &[("limit", "200")]).await?;
        let lowered = name.to_lowercase();
        Ok(list
            .members
            .iter()
            .find(|member| {
                member.name.to_lowercase() == lowered
                    || member.profile.display_name.to_lowercase() == lowered
                    || member.profile.real_name.to_lowercase() == lowered
            })
            .map(|member| UserProfile {
                id: member.id.clone(),
                display_name: member.best_name(),
            }))
    }
}

impl ChatStore for SlackClient {
    fn post_message(
        &self,
        channel: &str,
        message: OutgoingMessage,
    ) -> BoxFuture<'static, ChatResult<MessageRef>> {
        let this = self.clone();
        let payload = Self::message_payload(channel, &message);
        Box::pin(async move {
            let posted: PostedMessage = this.call("chat.postMessage", payload).await?;
            Ok(MessageRef::new(posted.channel, posted.ts))
        })
    }

    fn update_message(
        &self,
        at: &MessageRef,
        message: OutgoingMessage,
    ) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let mut payload = Self::message_payload(&at.channel, &message);
        payload["ts"] = json!(at.ts);
        Box::pin(async move {
            let _: PostedMessage = this.call("chat.update", payload).await?;
            Ok(())
        })
    }

    fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
    ) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let payload = json!({ "channel": channel, "user": user, "text": text });
        Box::pin(async move { this.call_ok("chat.postEphemeral", payload).await })
    }

    fn get_message(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<Option<ChatMessage>>> {
        let this = self.clone();
        let at = at.clone();
        Box::pin(async move {
            let list: MessageList = this
                .get(
                    "conversations.history",
                    &[
                        ("channel", at.channel.as_str()),
                        ("latest", at.ts.as_str()),
                        ("inclusive", "true"),
                        ("limit", "1"),
                    ],
                )
                .await?;
            Ok(list
                .messages
                .into_iter()
                .find(|message| message.ts == at.ts)
                .map(Into::into))
        })
    }

    fn list_thread_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> BoxFuture<'static, ChatResult<Vec<ChatMessage>>> {
        let this = self.clone();
        let channel = channel.to_owned();
        let thread_ts = thread_ts.to_owned();
        Box::pin(async move {
            let list: MessageList = this
                .get(
                    "conversations.replies",
                    &[
                        ("channel", channel.as_str()),
                        ("ts", thread_ts.as_str()),
                        ("limit", "200"),
                    ],
                )
                .await?;
            Ok(list.messages.into_iter().map(Into::into).collect())
        })
    }

    fn list_pinned(
        &self,
        channel: &str,
    ) -> BoxFuture<'static, ChatResult<Vec<(MessageRef, ChatMessage)>>> {
        let this = self.clone();
        let channel = channel.to_owned();
        Box::pin(async move {
            let list: PinList = this
                .get("pins.list", &[("channel", channel.as_str())])
                .await?;
            Ok(list
                .items
                .into_iter()
                .filter_map(|item| item.message)
                .map(|message| {
                    (
                        MessageRef::new(channel.clone(), message.ts.clone()),
                        message.into(),
                    )
                })
                .collect())
        })
    }

    fn pin(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let payload = json!({ "channel": at.channel, "timestamp": at.ts });
        Box::pin(async move { this.call_ok("pins.add", payload).await })
    }

    fn unpin(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let payload = json!({ "channel": at.channel, "timestamp": at.ts });
        Box::pin(async move { this.call_ok("pins.remove", payload).await })
    }

    fn open_dm(&self, user: &str) -> BoxFuture<'static, ChatResult<String>> {
        let this = self.clone();
        let payload = json!({ "users": user });
        Box::pin(async move {
            let opened: OpenedConversation = this.call("conversations.open", payload).await?;
            Ok(opened.channel.id)
        })
    }

    fn resolve_user(&self, query: &str) -> BoxFuture<'static, ChatResult<Option<UserProfile>>> {
        let this = self.clone();
        let token = Self::bare_user_token(query).to_owned();
        Box::pin(async move {
            if token.is_empty() {
                return Ok(None);
            }
            if Self::looks_like_user_id(&token) {
                return this.user_by_id(&token).await;
            }
            this.user_by_name(&token).await
        })
    }

    fn auth_identity(&self) -> BoxFuture<'static, ChatResult<String>> {
        let this = self.clone();
        Box::pin(async move {
            let auth: AuthTest = this.call("auth.test", json!({})).await?;
            Ok(auth.user_id)
        })
    }

    fn permalink(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<Option<String>>> {
        let this = self.clone();
        let at = at.clone();
        Box::pin(async move {
            let result = this
                .get::<Permalink>(
                    "chat.getPermalink",
                    &[
                        ("channel", at.channel.as_str()),
                        ("message_ts", at.ts.as_str()),
                    ],
                )
                .await;
            match result {
                Ok(link) => Ok(Some(link.permalink)),
                Err(ChatError::Api { reason, .. }) if reason == "message_not_found" => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    fn open_view(&self, trigger_id: &str, view: ModalView) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let payload = json!({
            "trigger_id": trigger_id,
            "view": serde_json::to_value(&view).unwrap_or_default(),
        });
        Box::pin(async move { this.call_ok("views.open", payload).await })
    }
}
