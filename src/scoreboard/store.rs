//! Pinned-message persistence for the scoreboard. Each channel carries two
//! independent pinned messages: the rendered display (found by a structural
//! block marker) and the data record (found by a fixed text header, body is
//! an encrypted code block). Both are created lazily, mutated in place, and
//! deduplicated by keeping the earliest copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::chat::{ChatMessage, ChatResult, ChatStore, MessageRef, OutgoingMessage};
use crate::chat::blocks::has_marker;
use crate::error::ServiceError;
use crate::scoreboard::crypto::ScoreboardCipher;
use crate::scoreboard::render::{SCOREBOARD_MARKER, display_blocks};
use crate::scoreboard::{ScoreError, ScoreboardData};

/// Fixed first line of the pinned data message.
const DATA_HEADER: &str = "Scoreboard Data";

/// Store handling both pinned scoreboard messages of a channel.
pub struct ScoreboardStore {
    chat: Arc<dyn ChatStore>,
    cipher: ScoreboardCipher,
}

impl ScoreboardStore {
    /// Store handle over the given chat backend.
    pub fn new(chat: Arc<dyn ChatStore>, cipher: ScoreboardCipher) -> Self {
        Self { chat, cipher }
    }

    /// Locate the pinned display message, creating and pinning an empty one
    /// when the channel has none yet. Duplicate display pins are resolved by
    /// keeping the earliest and unpinning the rest.
    pub async fn ensure_display(&self, channel: &str) -> ChatResult<MessageRef> {
        let candidates = self
            .pinned_matching(channel, |message| has_marker(&message.blocks, SCOREBOARD_MARKER))
            .await?;
        if let Some(canonical) = self.keep_earliest(candidates).await? {
            return Ok(canonical);
        }

        let data = ScoreboardData::default();
        let blocks = display_blocks(&data, &BTreeMap::new(), now());
        let at = self
            .chat
            .post_message(
                channel,
                OutgoingMessage::text("Puzzle scoreboard").with_blocks(blocks),
            )
            .await?;
        self.chat.pin(&at).await?;
        Ok(at)
    }

    /// Read the channel's scoreboard. Never errors: a missing or unreadable
    /// record is an empty board.
    pub async fn load(&self, channel: &str) -> ScoreboardData {
        match self.locate_data(channel).await {
            Ok(found) => self.decode_data(found),
            Err(err) => {
                warn!(channel, error = %err, "failed to read scoreboard data; treating as empty");
                ScoreboardData::default()
            }
        }
    }

    /// Read-modify-write the channel's scoreboard: apply the pure `mutator`,
    /// stamp the update time, re-render the display, re-encrypt and persist
    /// the data record. A mutator error aborts before either message is
    /// touched.
    pub async fn update<F>(&self, channel: &str, mutator: F) -> Result<ScoreboardData, ServiceError>
    where
        F: FnOnce(&mut ScoreboardData) -> Result<(), ScoreError>,
    {
        let display = self.ensure_display(channel).await?;
        // Unlike `load`, transport failures propagate here: overwriting the
        // record after a failed read would wipe the board.
        let located = self.locate_data(channel).await?;
        let data_at = located.as_ref().map(|(at, _)| at.clone());
        let mut data = self.decode_data(located);

        mutator(&mut data)?;
        data.last_updated = now();

        let names = self.resolve_names(&data).await;
        let blocks = display_blocks(&data, &names, now());
        self.chat
            .update_message(
                &display,
                OutgoingMessage::text("Puzzle scoreboard").with_blocks(blocks),
            )
            .await?;

        let payload = serde_json::to_vec(&data).map_err(|err| {
            ServiceError::InvalidState(format!("scoreboard serialization failed: {err}"))
        })?;
        let body = format!("{DATA_HEADER}\n```{}```", self.cipher.seal(&payload));
        match data_at {
            Some(at) => self.chat.update_message(&at, OutgoingMessage::text(body)).await?,
            None => {
                let at = self.chat.post_message(channel, OutgoingMessage::text(body)).await?;
                self.chat.pin(&at).await?;
            }
        }
        Ok(data)
    }

    /// Plain-text rendering of the channel's board, for surfaces without
    /// block support. Never errors, like [`Self::load`].
    pub async fn text_report(&self, channel: &str) -> String {
        let data = self.load(channel).await;
        let names = self.resolve_names(&data).await;
        crate::scoreboard::render::report_text(&data, &names, now())
    }

    /// Locate the pinned data message, deduplicating as for the display.
    async fn locate_data(&self, channel: &str) -> ChatResult<Option<(MessageRef, String)>> {
        let candidates = self
            .pinned_matching(channel, |message| message.text.starts_with(DATA_HEADER))
            .await?;
        let texts: BTreeMap<String, String> = candidates
            .iter()
            .map(|(at, message)| (at.ts.clone(), message.text.clone()))
            .collect();
        let Some(at) = self.keep_earliest(candidates).await? else {
            return Ok(None);
        };
        let text = texts.get(&at.ts).cloned().unwrap_or_default();
        Ok(Some((at, text)))
    }

    /// Decode a located data message, falling back from the encrypted format
    /// to the legacy plaintext JSON code block, and to an empty board when
    /// neither applies.
    fn decode_data(&self, located: Option<(MessageRef, String)>) -> ScoreboardData {
        let Some((at, text)) = located else {
            return ScoreboardData::default();
        };
        let Some(body) = code_block_body(&text) else {
            debug!(ts = at.ts, "scoreboard data message has no code block");
            return ScoreboardData::default();
        };
        if let Some(plaintext) = self.cipher.open(body)
            && let Ok(data) = serde_json::from_slice::<ScoreboardData>(&plaintext)
        {
            return data;
        }
        // Records written before encryption hold the JSON directly.
        if let Ok(data) = serde_json::from_str::<ScoreboardData>(body) {
            debug!(ts = at.ts, "read legacy plaintext scoreboard record");
            return data;
        }
        warn!(ts = at.ts, "scoreboard data message is unreadable; treating as empty");
        ScoreboardData::default()
    }

    async fn pinned_matching<F>(
        &self,
        channel: &str,
        mut predicate: F,
    ) -> ChatResult<Vec<(MessageRef, ChatMessage)>>
    where
        F: FnMut(&ChatMessage) -> bool,
    {
        let pinned = self.chat.list_pinned(channel).await?;
        let mut matching: Vec<(MessageRef, ChatMessage)> = pinned
            .into_iter()
            .filter(|(_, message)| predicate(message))
            .collect();
        matching.sort_by(|a, b| ts_order(&a.0.ts, &b.0.ts));
        Ok(matching)
    }

    /// Keep the earliest candidate as canonical, unpinning any later
    /// duplicates a race may have produced.
    async fn keep_earliest(
        &self,
        candidates: Vec<(MessageRef, ChatMessage)>,
    ) -> ChatResult<Option<MessageRef>> {
        let mut iter = candidates.into_iter();
        let Some((canonical, _)) = iter.next() else {
            return Ok(None);
        };
        for (duplicate, _) in iter {
            warn!(ts = duplicate.ts, "unpinning duplicate scoreboard message");
            self.chat.unpin(&duplicate).await?;
        }
        Ok(Some(canonical))
    }

    /// Best-effort display-name resolution for everyone on the board;
    /// unresolvable users render as their raw id.
    async fn resolve_names(&self, data: &ScoreboardData) -> BTreeMap<String, String> {
        let mut names = BTreeMap::new();
        for user in data.all_users() {
            match self.chat.resolve_user(user).await {
                Ok(Some(profile)) => {
                    names.insert(user.to_owned(), profile.display_name);
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(user, error = %err, "name resolution failed; rendering raw id");
                }
            }
        }
        names
    }
}

/// Platform timestamps sort numerically (`seconds.fraction`); fall back to
/// lexicographic order when they do not parse.
fn ts_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Body of the first triple-backtick code block, tolerating an optional
/// language tag on the opening fence.
fn code_block_body(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("```")?;
    let (body, _) = rest.split_once("```")?;
    let body = body.trim();
    Some(body.strip_prefix("json").map(str::trim).unwrap_or(body))
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
