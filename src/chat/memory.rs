//! In-memory [`ChatStore`] backend used by the test suite. Behaves like a
//! tiny single-workspace chat platform: timestamps are monotonic, threads are
//! flat reply lists, pins are per channel.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::chat::blocks::ModalView;
use crate::chat::{
    ChatError, ChatMessage, ChatResult, ChatStore, MessageRef, OutgoingMessage, UserProfile,
};

/// User id the fake platform assigns to the bot itself.
pub const BOT_USER: &str = "UBOT";

#[derive(Default)]
struct Inner {
    /// channel id -> messages in posting order.
    channels: BTreeMap<String, Vec<ChatMessage>>,
    /// channel id -> pinned timestamps in pin order.
    pins: BTreeMap<String, Vec<String>>,
    /// user id -> display name.
    users: BTreeMap<String, String>,
    /// Ephemeral notices, recorded for assertions.
    ephemerals: Vec<(String, String, String)>,
    /// Modal views opened, recorded for assertions.
    views: Vec<(String, ModalView)>,
    /// Coarse clock (unix seconds) used to mint timestamps.
    clock: i64,
    seq: u32,
    /// Methods that should fail on their next invocation.
    fail_once: Vec<&'static str>,
}

impl Inner {
    fn mint_ts(&mut self) -> String {
        self.seq += 1;
        format!("{}.{:06}", self.clock, self.seq)
    }

    fn trip(&mut self, method: &'static str) -> ChatResult<()> {
        if let Some(pos) = self.fail_once.iter().position(|m| *m == method) {
            self.fail_once.remove(pos);
            return Err(ChatError::api(method, "injected failure"));
        }
        Ok(())
    }
}

/// Cloneable handle to the fake platform.
#[derive(Clone, Default)]
pub struct MemoryChat {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryChat {
    /// Fresh fake platform starting at the given unix time.
    pub fn new(clock: i64) -> Self {
        let chat = Self::default();
        chat.set_clock(clock);
        chat
    }

    /// Advance (or rewind) the clock used for newly minted timestamps.
    pub fn set_clock(&self, clock: i64) {
        self.inner.lock().unwrap().clock = clock;
    }

    /// Register a user so `resolve_user` can find it.
    pub fn add_user(&self, id: &str, display_name: &str) {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(id.into(), display_name.into());
    }

    /// Make the next call to `method` fail.
    pub fn fail_next(&self, method: &'static str) {
        self.inner.lock().unwrap().fail_once.push(method);
    }

    /// Post a message as a human user rather than the bot.
    pub fn post_as(
        &self,
        user: &str,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> MessageRef {
        let mut inner = self.inner.lock().unwrap();
        let ts = inner.mint_ts();
        let message = ChatMessage {
            ts: ts.clone(),
            author: Some(user.into()),
            text: text.into(),
            thread_ts: thread_ts.map(Into::into),
            blocks: Vec::new(),
        };
        inner.channels.entry(channel.into()).or_default().push(message);
        MessageRef::new(channel, ts)
    }

    /// Raw text of a stored message, for assertions.
    pub fn text_of(&self, at: &MessageRef) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .channels
            .get(&at.channel)?
            .iter()
            .find(|m| m.ts == at.ts)
            .map(|m| m.text.clone())
    }

    /// All messages of a channel, for assertions.
    pub fn channel_messages(&self, channel: &str) -> Vec<ChatMessage> {
        let inner = self.inner.lock().unwrap();
        inner.channels.get(channel).cloned().unwrap_or_default()
    }

    /// Recorded ephemeral notices as `(channel, user, text)`.
    pub fn ephemerals(&self) -> Vec<(String, String, String)> {
        self.inner.lock().unwrap().ephemerals.clone()
    }

    /// Recorded modal views as `(trigger_id, view)`.
    pub fn views(&self) -> Vec<(String, ModalView)> {
        self.inner.lock().unwrap().views.clone()
    }

    /// Pinned timestamps of a channel in pin order.
    pub fn pinned_ts(&self, channel: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.pins.get(channel).cloned().unwrap_or_default()
    }
}

impl ChatStore for MemoryChat {
    fn post_message(
        &self,
        channel: &str,
        message: OutgoingMessage,
    ) -> BoxFuture<'static, ChatResult<MessageRef>> {
        let this = self.clone();
        let channel = channel.to_owned();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("post_message")?;
            let ts = inner.mint_ts();
            let stored = ChatMessage {
                ts: ts.clone(),
                author: Some(BOT_USER.into()),
                text: message.text,
                thread_ts: message.thread_ts,
                blocks: message.blocks.unwrap_or_default(),
            };
            inner.channels.entry(channel.clone()).or_default().push(stored);
            Ok(MessageRef::new(channel, ts))
        })
    }

    fn update_message(
        &self,
        at: &MessageRef,
        message: OutgoingMessage,
    ) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let at = at.clone();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("update_message")?;
            let found = inner
                .channels
                .get_mut(&at.channel)
                .and_then(|msgs| msgs.iter_mut().find(|m| m.ts == at.ts));
            match found {
                Some(stored) => {
                    // Updates replace the whole message; omitting blocks
                    // clears any that were there.
                    stored.text = message.text;
                    stored.blocks = message.blocks.unwrap_or_default();
                    Ok(())
                }
                None => Err(ChatError::api("update_message", "message_not_found")),
            }
        })
    }

    fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
    ) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let record = (channel.to_owned(), user.to_owned(), text.to_owned());
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("post_ephemeral")?;
            inner.ephemerals.push(record);
            Ok(())
        })
    }

    fn get_message(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<Option<ChatMessage>>> {
        let this = self.clone();
        let at = at.clone();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("get_message")?;
            Ok(inner
                .channels
                .get(&at.channel)
                .and_then(|msgs| msgs.iter().find(|m| m.ts == at.ts))
                .cloned())
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
            let mut inner = this.inner.lock().unwrap();
            inner.trip("list_thread_replies")?;
            let Some(messages) = inner.channels.get(&channel) else {
                return Ok(Vec::new());
            };
            let mut out: Vec<ChatMessage> = messages
                .iter()
                .filter(|m| m.ts == thread_ts)
                .cloned()
                .collect();
            out.extend(
                messages
                    .iter()
                    .filter(|m| m.thread_ts.as_deref() == Some(thread_ts.as_str()))
                    .cloned(),
            );
            Ok(out)
        })
    }

    fn list_pinned(
        &self,
        channel: &str,
    ) -> BoxFuture<'static, ChatResult<Vec<(MessageRef, ChatMessage)>>> {
        let this = self.clone();
        let channel = channel.to_owned();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("list_pinned")?;
            let pins = inner.pins.get(&channel).cloned().unwrap_or_default();
            let messages = inner.channels.get(&channel).cloned().unwrap_or_default();
            Ok(pins
                .iter()
                .filter_map(|ts| {
                    let found = messages.iter().find(|m| &m.ts == ts)?;
                    Some((MessageRef::new(channel.clone(), ts.clone()), found.clone()))
                })
                .collect())
        })
    }

    fn pin(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let at = at.clone();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("pin")?;
            let pins = inner.pins.entry(at.channel).or_default();
            if !pins.contains(&at.ts) {
                pins.push(at.ts);
            }
            Ok(())
        })
    }

    fn unpin(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let at = at.clone();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("unpin")?;
            if let Some(pins) = inner.pins.get_mut(&at.channel) {
                pins.retain(|ts| ts != &at.ts);
            }
            Ok(())
        })
    }

    fn open_dm(&self, user: &str) -> BoxFuture<'static, ChatResult<String>> {
        let this = self.clone();
        let user = user.to_owned();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("open_dm")?;
            Ok(format!("D{user}"))
        })
    }

    fn resolve_user(&self, query: &str) -> BoxFuture<'static, ChatResult<Option<UserProfile>>> {
        let this = self.clone();
        let query = query.to_owned();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("resolve_user")?;
            let bare = query
                .trim()
                .trim_start_matches("<@")
                .trim_end_matches('>')
                .split('|')
                .next()
                .unwrap_or_default()
                .trim_start_matches('@')
                .to_owned();
            let found = inner
                .users
                .iter()
                .find(|(id, name)| **id == bare || **name == bare)
                .map(|(id, name)| UserProfile {
                    id: id.clone(),
                    display_name: name.clone(),
                });
            Ok(found)
        })
    }

    fn auth_identity(&self) -> BoxFuture<'static, ChatResult<String>> {
        let this = self.clone();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("auth_identity")?;
            Ok(BOT_USER.into())
        })
    }

    fn permalink(&self, at: &MessageRef) -> BoxFuture<'static, ChatResult<Option<String>>> {
        let at = at.clone();
        Box::pin(async move { Ok(Some(format!("https://chat.invalid/{}/{}", at.channel, at.ts))) })
    }

    fn open_view(&self, trigger_id: &str, view: ModalView) -> BoxFuture<'static, ChatResult<()>> {
        let this = self.clone();
        let trigger_id = trigger_id.to_owned();
        Box::pin(async move {
            let mut inner = this.inner.lock().unwrap();
            inner.trip("open_view")?;
            inner.views.push((trigger_id, view));
            Ok(())
        })
    }
}
