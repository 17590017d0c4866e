//! Per-channel, per-year point and question-count ledger.
//!
//! The data itself is a pure value ([`ScoreboardData`]); persistence rides on
//! pinned chat messages (see [`store`]) and rendering is split out into
//! [`render`]. Mutations go through the methods here so the non-negative
//! invariant has a single owner.

pub mod crypto;
pub mod render;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// year -> user id -> count.
pub type YearLedger = BTreeMap<i32, BTreeMap<String, u32>>;

/// Error raised when a mutation would violate the ledger invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// A point adjustment would drive a score below zero.
    #[error("score for <@{user}> in {year} cannot go below zero (would be {value})")]
    NegativeScore {
        /// User whose score was adjusted.
        user: String,
        /// Year of the adjustment.
        year: i32,
        /// The value the score would have taken.
        value: i64,
    },
}

/// Scoreboard of one channel. Serialized shape matches the persisted JSON
/// payload, including the records written before encryption was introduced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreboardData {
    /// Points per user per year.
    pub scores_by_year: YearLedger,
    /// Questions asked per user per year.
    pub questions_by_year: YearLedger,
    /// Unix seconds of the last mutation.
    pub last_updated: i64,
}

impl ScoreboardData {
    /// Current score of a user in a year.
    pub fn score(&self, user: &str, year: i32) -> u32 {
        self.scores_by_year
            .get(&year)
            .and_then(|entries| entries.get(user))
            .copied()
            .unwrap_or(0)
    }

    /// Questions a user has asked in a year.
    pub fn questions(&self, user: &str, year: i32) -> u32 {
        self.questions_by_year
            .get(&year)
            .and_then(|entries| entries.get(user))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the board has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.scores_by_year.values().all(BTreeMap::is_empty)
            && self.questions_by_year.values().all(BTreeMap::is_empty)
    }

    /// Adjust a score by `delta` (either sign). Rejects the whole adjustment
    /// when the result would be negative; the stored value is untouched on
    /// rejection.
    pub fn add_points(&mut self, user: &str, year: i32, delta: i64) -> Result<u32, ScoreError> {
        let current = i64::from(self.score(user, year));
        let next = current + delta;
        if next < 0 {
            return Err(ScoreError::NegativeScore {
                user: user.to_owned(),
                year,
                value: next,
            });
        }
        let next = next as u32;
        self.scores_by_year
            .entry(year)
            .or_default()
            .insert(user.to_owned(), next);
        Ok(next)
    }

    /// Overwrite a score regardless of its prior value.
    pub fn set_score(&mut self, user: &str, year: i32, value: u32) {
        self.scores_by_year
            .entry(year)
            .or_default()
            .insert(user.to_owned(), value);
    }

    /// Count one asked question.
    pub fn add_question(&mut self, user: &str, year: i32) {
        let entry = self
            .questions_by_year
            .entry(year)
            .or_default()
            .entry(user.to_owned())
            .or_insert(0);
        *entry += 1;
    }

    /// Undo one asked question. A count of zero is a no-op; a count that
    /// reaches zero is removed rather than stored.
    pub fn remove_question(&mut self, user: &str, year: i32) {
        let Some(entries) = self.questions_by_year.get_mut(&year) else {
            return;
        };
        match entries.get(user).copied() {
            None | Some(0) => {}
            Some(1) => {
                entries.remove(user);
                if entries.is_empty() {
                    self.questions_by_year.remove(&year);
                }
            }
            Some(count) => {
                entries.insert(user.to_owned(), count - 1);
            }
        }
    }

    /// Every user id appearing anywhere in the ledger.
    pub fn all_users(&self) -> Vec<&str> {
        let mut users: Vec<&str> = self
            .scores_by_year
            .values()
            .chain(self.questions_by_year.values())
            .flat_map(|entries| entries.keys().map(String::as_str))
            .collect();
        users.sort_unstable();
        users.dedup();
        users
    }
}

/// Year a thread belongs to, derived from its platform timestamp
/// (`seconds.fraction`). Scoring uses this rather than wall-clock time so a
/// round confirmed late still counts toward the year it was asked in.
pub fn year_of_thread(thread_ts: &str) -> Option<i32> {
    let seconds: i64 = thread_ts.split('.').next()?.parse().ok()?;
    let datetime = OffsetDateTime::from_unix_timestamp(seconds).ok()?;
    Some(datetime.year())
}
