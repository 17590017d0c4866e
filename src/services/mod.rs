/// Solve confirmation handshake (DM Yes/No round-trip).
pub mod confirm_service;
/// Round lifecycle: create, solve, edit, close, nudge.
pub mod round_service;
/// Scoreboard reports and admin score commands.
pub mod stats_service;

#[cfg(test)]
pub mod testutil;
