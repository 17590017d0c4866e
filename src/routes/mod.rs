use axum::Router;

use crate::state::SharedState;

pub mod commands;
pub mod events;
pub mod health;
pub mod interactivity;

/// Compose all route trees, wiring in shared state.
pub fn router(state: SharedState) -> Router<()> {
    commands::router()
        .merge(events::router())
        .merge(interactivity::router())
        .merge(health::router())
        .with_state(state)
}
