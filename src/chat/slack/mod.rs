//! Slack Web API backend for [`ChatStore`](crate::chat::ChatStore).

mod client;
mod models;

pub use client::SlackClient;

/// Connection settings for the Slack Web API.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`).
    pub token: String,
    /// API base URL, overridable for proxies and tests.
    pub base_url: String,
}

impl SlackConfig {
    /// Config pointing at the public Slack API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: "https://slack.com/api".into(),
        }
    }
}
