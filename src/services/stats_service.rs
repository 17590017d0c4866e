//! Scoreboard reports and the admin-only score mutations behind the
//! `scoreboard`, `stats`, `setscore`, `addpoint`, and `removepoint`
//! commands.

use time::OffsetDateTime;
use tracing::info;

use crate::error::ServiceError;
use crate::state::SharedState;

/// Point the user at the pinned scoreboard, falling back to a text report
/// when no permalink is available.
pub async fn scoreboard_overview(
    state: &SharedState,
    channel: &str,
) -> Result<String, ServiceError> {
    let store = state.scoreboard();
    let display = store.ensure_display(channel).await?;
    match state.chat().permalink(&display).await? {
        Some(link) => Ok(format!("The scoreboard is pinned in this channel: {link}")),
        None => Ok(store.text_report(channel).await),
    }
}

/// Stats for one user, or the whole channel when no target is given.
pub async fn stats(
    state: &SharedState,
    channel: &str,
    target: Option<&str>,
) -> Result<String, ServiceError> {
    let store = state.scoreboard();
    let Some(target) = target else {
        return Ok(store.text_report(channel).await);
    };

    let profile = resolve_target(state, target).await?;
    let data = store.load(channel).await;

    let mut years: Vec<i32> = data
        .scores_by_year
        .keys()
        .chain(data.questions_by_year.keys())
        .copied()
        .collect();
    years.sort_unstable();
    years.dedup();
    years.reverse();

    let mut lines = Vec::new();
    for year in years {
        let score = data.score(&profile.id, year);
        let questions = data.questions(&profile.id, year);
        if score == 0 && questions == 0 {
            continue;
        }
        lines.push(format!(
            "{year}: {score} {}, {questions} {} asked",
            plural(score, "point", "points"),
            plural(questions, "question", "questions"),
        ));
    }
    if lines.is_empty() {
        return Ok(format!("No recorded activity for {}.", profile.display_name));
    }
    Ok(format!("Stats for {}:\n{}", profile.display_name, lines.join("\n")))
}

/// Admin command: set a score to an exact value regardless of its prior
/// value.
pub async fn set_score(
    state: &SharedState,
    channel: &str,
    actor: &str,
    target: &str,
    value: u32,
    year: Option<i32>,
) -> Result<String, ServiceError> {
    require_admin(state, actor)?;
    let profile = resolve_target(state, target).await?;
    let year = year.unwrap_or_else(current_year);
    state
        .scoreboard()
        .update(channel, |data| {
            data.set_score(&profile.id, year, value);
            Ok(())
        })
        .await?;
    info!(channel, actor, target = profile.id, value, year, "score set");
    Ok(format!("Set <@{}>'s {year} score to {value}.", profile.id))
}

/// Admin command: award one point.
pub async fn add_point(
    state: &SharedState,
    channel: &str,
    actor: &str,
    target: &str,
    year: Option<i32>,
) -> Result<String, ServiceError> {
    adjust_point(state, channel, actor, target, year, 1).await
}

/// Admin command: take one point away. Rejected outright when the score is
/// already zero.
pub async fn remove_point(
    state: &SharedState,
    channel: &str,
    actor: &str,
    target: &str,
    year: Option<i32>,
) -> Result<String, ServiceError> {
    adjust_point(state, channel, actor, target, year, -1).await
}

async fn adjust_point(
    state: &SharedState,
    channel: &str,
    actor: &str,
    target: &str,
    year: Option<i32>,
    delta: i64,
) -> Result<String, ServiceError> {
    require_admin(state, actor)?;
    let profile = resolve_target(state, target).await?;
    let year = year.unwrap_or_else(current_year);
    let mut new_score = 0;
    state
        .scoreboard()
        .update(channel, |data| {
            new_score = data.add_points(&profile.id, year, delta)?;
            Ok(())
        })
        .await?;
    info!(channel, actor, target = profile.id, delta, year, "score adjusted");
    Ok(format!(
        "<@{}> now has {new_score} {} for {year}.",
        profile.id,
        plural(new_score, "point", "points")
    ))
}

fn require_admin(state: &SharedState, actor: &str) -> Result<(), ServiceError> {
    if state.is_admin(actor) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(
            "Only admins can change scores directly.".into(),
        ))
    }
}

async fn resolve_target(
    state: &SharedState,
    target: &str,
) -> Result<crate::chat::UserProfile, ServiceError> {
    state
        .chat()
        .resolve_user(target)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No user matching `{target}`.")))
}

fn plural<'a>(count: u32, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}
