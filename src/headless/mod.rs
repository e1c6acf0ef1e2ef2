//! Headless owner mode
//!
//! The first instance has no media engine attached. It keeps a
//! [`HeadlessPlayer`] that tracks what a real player would, applies its own
//! command line to it and then serves remote commands from later
//! instances.

pub mod player;
pub mod runner;

pub use player::{AspectRatio, HeadlessPlayer, PlayerState};
pub use runner::run_owner;
