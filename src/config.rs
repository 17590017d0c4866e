//! Environment-driven runtime configuration.

use std::env;

use anyhow::{Context, bail};

/// Environment variable holding the chat platform bot token.
const BOT_TOKEN_ENV: &str = "SIDEWAYS_BOT_TOKEN";
/// Environment variable holding the scoreboard encryption secret.
const SCOREBOARD_SECRET_ENV: &str = "SIDEWAYS_SCOREBOARD_SECRET";
/// Comma-separated user ids allowed to run admin commands.
const ADMINS_ENV: &str = "SIDEWAYS_ADMINS";
/// Channel where the OP may confirm their own messages (self-testing).
const TEST_CHANNEL_ENV: &str = "SIDEWAYS_TEST_CHANNEL";
/// Reaction name that marks a guess as correct.
const CONFIRM_EMOJI_ENV: &str = "SIDEWAYS_CONFIRM_EMOJI";
/// Default affirmative reaction.
const DEFAULT_CONFIRM_EMOJI: &str = "white_check_mark";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Chat platform bot token.
    pub bot_token: String,
    /// Secret the scoreboard cipher key is derived from. Required: there is
    /// deliberately no built-in default key.
    pub scoreboard_secret: String,
    /// Users allowed to run the score-mutating admin commands.
    pub admin_users: Vec<String>,
    /// Designated test channel, if any.
    pub test_channel: Option<String>,
    /// Reaction name treated as "this guess is correct".
    pub confirm_emoji: String,
    /// Port the webhook server listens on.
    pub port: u16,
}

impl AppConfig {
    /// Load the configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let bot_token = env::var(BOT_TOKEN_ENV)
            .with_context(|| format!("{BOT_TOKEN_ENV} must be set"))?;
        let Ok(scoreboard_secret) = env::var(SCOREBOARD_SECRET_ENV) else {
            bail!(
                "{SCOREBOARD_SECRET_ENV} must be set; refusing to run with a \
                 built-in scoreboard key"
            );
        };
        if scoreboard_secret.is_empty() {
            bail!("{SCOREBOARD_SECRET_ENV} must not be empty");
        }

        let port = env::var("PORT")
            .or_else(|_| env::var("SIDEWAYS_PORT"))
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        Ok(Self {
            bot_token,
            scoreboard_secret,
            admin_users: parse_admins(&env::var(ADMINS_ENV).unwrap_or_default()),
            test_channel: env::var(TEST_CHANNEL_ENV).ok().filter(|v| !v.is_empty()),
            confirm_emoji: env::var(CONFIRM_EMOJI_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_CONFIRM_EMOJI.into()),
            port,
        })
    }
}

/// Split the admin list, tolerating blanks and stray whitespace.
fn parse_admins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
