//! Encoding of round state into chat-message text, plus the thread reference
//! tokens embedded in button payloads.
//!
//! The control message carries `v1:` followed by URL-safe base64 of the JSON
//! record, so the state is opaque to thread readers and new optional fields
//! never break old decoders. Decoding tries the token form first and then a
//! legacy human-readable line format still found in old threads; the two
//! grammars stay separate decoders, tried in order.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::round::{Round, RoundStatus};

/// Prefix of the current opaque control-message format.
const TOKEN_PREFIX: &str = "v1:";

/// Encode a round for storage in its control message.
pub fn encode_round(round: &Round) -> String {
    // Serializing a plain struct cannot fail.
    let json = serde_json::to_vec(round).expect("round serializes");
    format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
}

/// Decode control-message text in either supported format.
pub fn decode_round(text: &str) -> Option<Round> {
    decode_token(text).or_else(|| decode_legacy(text))
}

fn decode_token(text: &str) -> Option<Round> {
    let encoded = text.trim().strip_prefix(TOKEN_PREFIX)?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Legacy fixed-grammar line:
/// `op=<id> status=<OPEN|SOLVED|CLOSED> threadId=<id> channelId=<id> [answer=<text>]`.
/// Fields appear in exactly this order; the answer, when present, runs to the
/// end of the line.
fn decode_legacy(text: &str) -> Option<Round> {
    let rest = text.trim().strip_prefix("op=")?;
    let (op, rest) = rest.split_once(" status=")?;
    let (status, rest) = rest.split_once(" threadId=")?;
    let status = RoundStatus::parse(status)?;
    let (thread_ts, rest) = rest.split_once(" channelId=")?;
    let (channel_id, answer) = match rest.split_once(" answer=") {
        Some((channel, answer)) => (channel, Some(answer.to_owned())),
        None => (rest, None),
    };
    if [op, thread_ts, channel_id]
        .iter()
        .any(|field| field.is_empty() || field.contains(char::is_whitespace))
    {
        return None;
    }
    // Rewrites always use the current token format, so the record is tagged
    // with the current version as soon as it is decoded.
    Some(Round {
        version: crate::round::ROUND_VERSION,
        op: op.to_owned(),
        status,
        thread_ts: thread_ts.to_owned(),
        channel_id: channel_id.to_owned(),
        question: None,
        answer,
    })
}

/// Encode a `(channel, thread)` pair for embedding in button values, so raw
/// identifiers are not shown in callback metadata. Obfuscation only, not a
/// security boundary.
pub fn encode_thread_ref(channel: &str, thread_ts: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("{channel}:{thread_ts}"))
}

/// Reverse of [`encode_thread_ref`].
pub fn decode_thread_ref(value: &str) -> Option<(String, String)> {
    let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let (channel, thread_ts) = decoded.split_once(':')?;
    if channel.is_empty() || thread_ts.is_empty() {
        return None;
    }
    Some((channel.to_owned(), thread_ts.to_owned()))
}
