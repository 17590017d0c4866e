//! Central application state shared across request handlers. The bot keeps
//! almost nothing in memory by design; durable state lives in the chat
//! transcript. What remains is the config, the chat backend, and the one
//! legitimately cached value: the bot's own identity.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::chat::{ChatResult, ChatStore};
use crate::config::AppConfig;
use crate::round::store::RoundStore;
use crate::scoreboard::crypto::ScoreboardCipher;
use crate::scoreboard::store::ScoreboardStore;

/// Shared handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Process-wide application state.
pub struct AppState {
    config: AppConfig,
    chat: Arc<dyn ChatStore>,
    cipher: ScoreboardCipher,
    bot_user: OnceCell<String>,
    guesses: GuessDetector,
}

impl AppState {
    /// Construct the state wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, chat: Arc<dyn ChatStore>) -> SharedState {
        let cipher = ScoreboardCipher::new(&config.scoreboard_secret);
        Arc::new(Self {
            cipher,
            chat,
            bot_user: OnceCell::new(),
            guesses: GuessDetector::default(),
            config,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the chat backend.
    pub fn chat(&self) -> Arc<dyn ChatStore> {
        self.chat.clone()
    }

    /// The bot's own user id, resolved once per process lifetime and cached.
    /// Cheap to race on: recomputing is idempotent.
    pub async fn bot_user_id(&self) -> ChatResult<&str> {
        self.bot_user
            .get_or_try_init(|| async { self.chat.auth_identity().await })
            .await
            .map(String::as_str)
    }

    /// Round store bound to the resolved bot identity.
    pub async fn rounds(&self) -> ChatResult<RoundStore> {
        let bot_user = self.bot_user_id().await?;
        Ok(RoundStore::new(self.chat(), bot_user))
    }

    /// Scoreboard store for pinned-message persistence.
    pub fn scoreboard(&self) -> ScoreboardStore {
        ScoreboardStore::new(self.chat(), self.cipher.clone())
    }

    /// Predicate deciding whether a thread message reads like a guess.
    pub fn guesses(&self) -> &GuessDetector {
        &self.guesses
    }

    /// Whether the user may run admin commands.
    pub fn is_admin(&self, user: &str) -> bool {
        self.config.admin_users.iter().any(|admin| admin == user)
    }

    /// Whether the channel is the designated test channel, where the OP may
    /// confirm their own messages.
    pub fn is_test_channel(&self, channel: &str) -> bool {
        self.config.test_channel.as_deref() == Some(channel)
    }
}

/// Heuristic spotting messages that look like guesses. The prefixes are a
/// value, not a contract: swap the list without touching the lifecycle code.
#[derive(Debug, Clone)]
pub struct GuessDetector {
    prefixes: Vec<String>,
}

impl Default for GuessDetector {
    fn default() -> Self {
        Self {
            prefixes: ["my guess", "guess:", "answer:", "is it"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl GuessDetector {
    /// Detector with a custom prefix list.
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    /// Whether `text` lexically resembles a guess.
    pub fn looks_like_guess(&self, text: &str) -> bool {
        let lowered = text.trim().to_lowercase();
        self.prefixes.iter().any(|prefix| lowered.starts_with(prefix))
    }
}
