//! Player collaborator interface
//!
//! The owner knows nothing about playback. Decoded commands are handed to
//! an implementation of [`PlayerControl`]; the two query opcodes read its
//! state back.

use solo_core::prelude::*;

use crate::command::Command;

/// Operations the remote-command layer needs from a player.
///
/// Uses `trait_variant` so the `Send` variant can be shared across the
/// owner's per-connection tasks.
#[trait_variant::make(PlayerControl: Send)]
pub trait LocalPlayerControl {
    /// Act on one decoded command. Query opcodes never reach this.
    async fn apply(&self, command: &Command) -> Result<()>;

    /// Title (or URL) of the current item, if anything is loaded.
    async fn now_playing(&self) -> Option<String>;

    /// Current volume in `0.0..=1.0`, if known.
    async fn volume(&self) -> Option<f64>;
}
