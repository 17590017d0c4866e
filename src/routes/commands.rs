//! The slash-command surface. Free text starts a round; everything else is a
//! small keyword language dispatched to the services. Responses are always
//! ephemeral to the invoker.

use axum::{Json, Router, extract::State, routing::post};
use axum::extract::Form;
use serde::Serialize;
use tracing::error;

use crate::dto::events::SlashCommand;
use crate::error::ServiceError;
use crate::services::{round_service, stats_service};
use crate::state::SharedState;

const HELP_TEXT: &str = "\
*How to play*\n\
`/puzzle <question>` starts a round in this channel. Others reply in the \
thread with guesses; you mark the winning guess with the confirmation \
reaction, or guessers can use the *Answer privately* button.\n\
\n\
*Commands*\n\
• `/puzzle help` shows this text\n\
• `/puzzle scoreboard` points at the pinned scoreboard\n\
• `/puzzle stats [@user]` shows per-year stats\n\
• `/puzzle setscore @user <points> [year]` (admin)\n\
• `/puzzle addpoint @user [year]` (admin)\n\
• `/puzzle removepoint @user [year]` (admin)";

/// Parsed form of the slash command text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start(String),
    Help,
    Scoreboard,
    Stats(Option<String>),
    SetScore {
        target: String,
        value: u32,
        year: Option<i32>,
    },
    AddPoint {
        target: String,
        year: Option<i32>,
    },
    RemovePoint {
        target: String,
        year: Option<i32>,
    },
}

/// Slash responses render ephemerally to the invoker.
#[derive(Debug, Serialize)]
struct CommandResponse {
    response_type: &'static str,
    text: String,
}

fn ephemeral(text: impl Into<String>) -> Json<CommandResponse> {
    Json(CommandResponse {
        response_type: "ephemeral",
        text: text.into(),
    })
}

/// Handle one slash command invocation.
pub async fn slash_command(
    State(state): State<SharedState>,
    Form(invocation): Form<SlashCommand>,
) -> Json<CommandResponse> {
    let command = match parse_command(&invocation.text) {
        Ok(command) => command,
        Err(usage) => return ephemeral(usage),
    };

    let result = dispatch(&state, &invocation, command).await;
    match result {
        Ok(text) => ephemeral(text),
        Err(err) => {
            error!(
                user = invocation.user_id,
                channel = invocation.channel_id,
                error = %err,
                "slash command failed"
            );
            ephemeral(err.user_notice())
        }
    }
}

async fn dispatch(
    state: &SharedState,
    invocation: &SlashCommand,
    command: Command,
) -> Result<String, ServiceError> {
    let channel = invocation.channel_id.as_str();
    let user = invocation.user_id.as_str();
    match command {
        Command::Start(question) => {
            round_service::start_round(state, channel, user, &question).await?;
            Ok("Round started. Good luck everyone!".into())
        }
        Command::Help => Ok(HELP_TEXT.into()),
        Command::Scoreboard => stats_service::scoreboard_overview(state, channel).await,
        Command::Stats(target) => stats_service::stats(state, channel, target.as_deref()).await,
        Command::SetScore { target, value, year } => {
            stats_service::set_score(state, channel, user, &target, value, year).await
        }
        Command::AddPoint { target, year } => {
            stats_service::add_point(state, channel, user, &target, year).await
        }
        Command::RemovePoint { target, year } => {
            stats_service::remove_point(state, channel, user, &target, year).await
        }
    }
}

/// Parse the free text after the slash command. Anything that is not a known
/// keyword starts a round with that text as the question.
fn parse_command(text: &str) -> Result<Command, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Command::Help);
    }
    let mut words = trimmed.split_whitespace();
    let keyword = words.next().unwrap_or_default().to_lowercase();
    match keyword.as_str() {
        "help" => Ok(Command::Help),
        "scoreboard" => Ok(Command::Scoreboard),
        "stats" => Ok(Command::Stats(words.next().map(String::from))),
        "setscore" => {
            let usage = "Usage: `setscore @user <points> [year]`";
            let target = words.next().ok_or(usage)?.to_owned();
            let value = words
                .next()
                .and_then(|raw| raw.parse::<u32>().ok())
                .ok_or(usage)?;
            let year = parse_year(words.next())?;
            Ok(Command::SetScore { target, value, year })
        }
        "addpoint" | "removepoint" => {
            let usage = format!("Usage: `{keyword} @user [year]`");
            let target = words.next().ok_or(usage)?.to_owned();
            let year = parse_year(words.next())?;
            if keyword == "addpoint" {
                Ok(Command::AddPoint { target, year })
            } else {
                Ok(Command::RemovePoint { target, year })
            }
        }
        _ => Ok(Command::Start(trimmed.to_owned())),
    }
}

fn parse_year(word: Option<&str>) -> Result<Option<i32>, String> {
    match word {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| format!("`{raw}` is not a year")),
    }
}

/// Configure the slash-command routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/slack/commands", post(slash_command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_starts_a_round() {
        assert_eq!(
            parse_command("What has keys but no locks?"),
            Ok(Command::Start("What has keys but no locks?".into()))
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(parse_command("Help"), Ok(Command::Help));
        assert_eq!(parse_command(""), Ok(Command::Help));
        assert_eq!(parse_command("SCOREBOARD"), Ok(Command::Scoreboard));
        assert_eq!(parse_command("stats"), Ok(Command::Stats(None)));
        assert_eq!(
            parse_command("stats @anna"),
            Ok(Command::Stats(Some("@anna".into())))
        );
    }

    #[test]
    fn admin_commands_parse_their_arguments() {
        assert_eq!(
            parse_command("setscore @bob 5 2024"),
            Ok(Command::SetScore {
                target: "@bob".into(),
                value: 5,
                year: Some(2024),
            })
        );
        assert_eq!(
            parse_command("addpoint @bob"),
            Ok(Command::AddPoint {
                target: "@bob".into(),
                year: None,
            })
        );
        assert_eq!(
            parse_command("removepoint @bob 2024"),
            Ok(Command::RemovePoint {
                target: "@bob".into(),
                year: Some(2024),
            })
        );
    }

    #[test]
    fn malformed_admin_commands_report_usage() {
        assert!(parse_command("setscore @bob").is_err());
        assert!(parse_command("setscore @bob five").is_err());
        assert!(parse_command("addpoint").is_err());
        assert!(parse_command("removepoint @bob soon").is_err());
    }
}
