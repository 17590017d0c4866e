//! Human-facing rendering of the scoreboard: the pinned rich-block display
//! and a text-only variant for surfaces without block support.

use std::collections::BTreeMap;

use crate::chat::blocks::{Block, context, marked_header, section};
use crate::scoreboard::ScoreboardData;

/// Structural marker carried by the pinned display message, used to find it
/// again without matching on free text.
pub const SCOREBOARD_MARKER: &str = "scoreboard_header";

/// Widest the name column gets before truncation.
const NAME_WIDTH: usize = 20;
const SCORE_WIDTH: usize = 5;

/// Render the pinned display message blocks.
pub fn display_blocks(
    data: &ScoreboardData,
    names: &BTreeMap<String, String>,
    now: i64,
) -> Vec<Block> {
    let mut blocks = vec![marked_header(SCOREBOARD_MARKER, "Puzzle scoreboard")];
    if data.scores_by_year.is_empty() {
        blocks.push(section("No points on the board yet. Start a round!"));
    }
    for (year, entries) in data.scores_by_year.iter().rev() {
        if entries.is_empty() {
            continue;
        }
        blocks.push(section(format!(
            "*{year}*\n```{}```",
            year_table(entries, names)
        )));
    }
    blocks.push(context(format!(
        "Last updated {}",
        relative_age(data.last_updated, now)
    )));
    blocks
}

/// Render the same content as plain text, one year after another, without
/// any table-drawing characters.
pub fn report_text(data: &ScoreboardData, names: &BTreeMap<String, String>, now: i64) -> String {
    if data.scores_by_year.is_empty() {
        return "No points on the board yet.".into();
    }
    let mut out = String::new();
    for (year, entries) in data.scores_by_year.iter().rev() {
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("{year}:\n"));
        for (user, score) in sorted_entries(entries) {
            out.push_str(&format!("  {}: {score}\n", display_name(names, user)));
        }
    }
    out.push_str(&format!(
        "Last updated {}",
        relative_age(data.last_updated, now)
    ));
    out
}

/// Entries of one year, highest score first, name as tiebreak.
fn sorted_entries(entries: &BTreeMap<String, u32>) -> Vec<(&String, u32)> {
    let mut sorted: Vec<(&String, u32)> = entries.iter().map(|(k, v)| (k, *v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
}

fn display_name<'a>(names: &'a BTreeMap<String, String>, user: &'a str) -> &'a str {
    names.get(user).map(String::as_str).unwrap_or(user)
}

/// One year as a fixed-width box-drawing table.
fn year_table(entries: &BTreeMap<String, u32>, names: &BTreeMap<String, String>) -> String {
    let mut table = String::new();
    table.push_str(&format!(
        "┌{}┬{}┐\n",
        "─".repeat(NAME_WIDTH + 2),
        "─".repeat(SCORE_WIDTH + 2)
    ));
    table.push_str(&format!(
        "│ {:<NAME_WIDTH$} │ {:>SCORE_WIDTH$} │\n",
        "Name", "Score"
    ));
    table.push_str(&format!(
        "├{}┼{}┤\n",
        "─".repeat(NAME_WIDTH + 2),
        "─".repeat(SCORE_WIDTH + 2)
    ));
    for (user, score) in sorted_entries(entries) {
        table.push_str(&format!(
            "│ {:<NAME_WIDTH$} │ {score:>SCORE_WIDTH$} │\n",
            truncate_name(display_name(names, user))
        ));
    }
    table.push_str(&format!(
        "└{}┴{}┘",
        "─".repeat(NAME_WIDTH + 2),
        "─".repeat(SCORE_WIDTH + 2)
    ));
    table
}

/// Cap a name at the column width, ellipsizing when it overflows.
fn truncate_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= NAME_WIDTH {
        return name.to_owned();
    }
    let mut out: String = chars[..NAME_WIDTH - 1].iter().collect();
    out.push('…');
    out
}

/// Coarse relative age, newest bucket first.
fn relative_age(then: i64, now: i64) -> String {
    let delta = (now - then).max(0);
    match delta {
        0..60 => "just now".into(),
        60..3600 => format!("{} minutes ago", delta / 60),
        3600..86_400 => format!("{} hours ago", delta / 3600),
        _ => format!("{} days ago", delta / 86_400),
    }
}
