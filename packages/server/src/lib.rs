//! Multi-room chat relay with per-recipient translation.
//!
//! Participants connect to a room over a WebSocket, pick a display name and a
//! reading language, and every chat line is delivered to the other members of
//! the room translated into each member's language.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

#[cfg(test)]
mod test_support;
