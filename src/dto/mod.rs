/// Typed button/action identifiers and their payloads.
pub mod actions;
/// Inbound webhook payloads (slash commands, event callbacks, interactions).
pub mod events;
