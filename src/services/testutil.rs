//! Shared fixtures for service-level tests.

use std::sync::Arc;

use crate::chat::memory::MemoryChat;
use crate::config::AppConfig;
use crate::state::{AppState, SharedState};

/// State over the fake platform: `UADMIN` is an admin and `CTEST` is the
/// designated test channel.
pub fn test_state(chat: &MemoryChat) -> SharedState {
    AppState::new(
        AppConfig {
            bot_token: "xoxb-test".into(),
            scoreboard_secret: "test secret".into(),
            admin_users: vec!["UADMIN".into()],
            test_channel: Some("CTEST".into()),
            confirm_emoji: "white_check_mark".into(),
            port: 0,
        },
        Arc::new(chat.clone()),
    )
}
