//! Puzzle round model and its two-transition state machine.

pub mod codec;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current control-message format tag; see [`codec`].
pub const ROUND_VERSION: u8 = 1;

fn default_version() -> u8 {
    ROUND_VERSION
}

/// Lifecycle status of a round. `Solved` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundStatus {
    /// Accepting guesses.
    Open,
    /// Confirmed solved; answer recorded.
    Solved,
    /// Closed by the OP without a solve.
    Closed,
}

impl RoundStatus {
    /// Wire spelling of the status, shared by codec and instruction message.
    pub fn as_str(self) -> &'static str {
        match self {
            RoundStatus::Open => "OPEN",
            RoundStatus::Solved => "SOLVED",
            RoundStatus::Closed => "CLOSED",
        }
    }

    /// Parse the wire spelling; anything outside the closed set is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPEN" => Some(RoundStatus::Open),
            "SOLVED" => Some(RoundStatus::Solved),
            "CLOSED" => Some(RoundStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a transition is attempted on a settled round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("round is already {status}")]
pub struct AlreadySettled {
    /// Terminal status the round is in.
    pub status: RoundStatus,
}

/// One puzzle round, anchored to one thread. The control message in the
/// thread holds the encoded form of this record; it is always rewritten
/// whole, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Format tag for forward compatibility.
    #[serde(default = "default_version")]
    pub version: u8,
    /// The original poster; holds exclusive control rights.
    pub op: String,
    /// Lifecycle status.
    pub status: RoundStatus,
    /// Timestamp of the thread root; primary key within the channel.
    pub thread_ts: String,
    /// Channel containing the thread.
    pub channel_id: String,
    /// Canonical question text. Absent only for rounds predating this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Accepted answer; present iff the round is solved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl Round {
    /// Fresh open round.
    pub fn open(
        op: impl Into<String>,
        channel_id: impl Into<String>,
        thread_ts: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            version: ROUND_VERSION,
            op: op.into(),
            status: RoundStatus::Open,
            thread_ts: thread_ts.into(),
            channel_id: channel_id.into(),
            question: Some(question.into()),
            answer: None,
        }
    }

    /// Whether the round is in a terminal state.
    pub fn is_settled(&self) -> bool {
        !matches!(self.status, RoundStatus::Open)
    }

    /// Transition `OPEN -> SOLVED`, recording the accepted answer.
    pub fn solve(&mut self, answer: impl Into<String>) -> Result<(), AlreadySettled> {
        self.ensure_open()?;
        self.status = RoundStatus::Solved;
        self.answer = Some(answer.into());
        Ok(())
    }

    /// Transition `OPEN -> CLOSED`.
    pub fn close(&mut self) -> Result<(), AlreadySettled> {
        self.ensure_open()?;
        self.status = RoundStatus::Closed;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), AlreadySettled> {
        match self.status {
            RoundStatus::Open => Ok(()),
            status => Err(AlreadySettled { status }),
        }
    }
}
