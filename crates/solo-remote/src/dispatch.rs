//! Owner-side dispatch: records in, player calls out
//!
//! [`Dispatcher`] is the [`MessageHandler`] the owner serves with. It decodes
//! each record under the configured [`BatchPolicy`], answers the query
//! opcodes itself and forwards everything else to the player. Nothing a
//! caller sends can stop the owner: bad records and player failures are
//! logged and skipped.

use solo_core::prelude::*;
use solo_transport::MessageHandler;

use crate::batch::{BatchDecoder, BatchPolicy};
use crate::command::{Command, Opcode};
use crate::player::PlayerControl;

/// Reply to a query when the player has nothing to report.
pub const NO_VALUE_REPLY: &str = "NONE";

/// Routes decoded commands to a [`PlayerControl`].
#[derive(Debug)]
pub struct Dispatcher<P> {
    player: P,
    policy: BatchPolicy,
}

impl<P: PlayerControl + Sync> Dispatcher<P> {
    pub fn new(player: P, policy: BatchPolicy) -> Self {
        Self { player, policy }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Run one decoded command. Returns the reply for query opcodes.
    pub async fn dispatch(&self, command: &Command) -> Option<Vec<u8>> {
        match command.opcode() {
            Opcode::ShowPlaying => {
                let title = self.player.now_playing().await;
                Some(playing_reply(title).into_bytes())
            }
            Opcode::ShowVolume => {
                let volume = self.player.volume().await;
                Some(volume_reply(volume).into_bytes())
            }
            _ => {
                debug!("Dispatching {}", command);
                if let Err(e) = self.player.apply(command).await {
                    warn!("Player rejected '{}': {}", command, e);
                }
                None
            }
        }
    }
}

impl<P> MessageHandler for Dispatcher<P>
where
    P: PlayerControl + Sync + 'static,
{
    type Session = BatchDecoder;

    async fn on_message(&self, session: &mut BatchDecoder, record: Vec<u8>) -> Option<Vec<u8>> {
        match session.decode(self.policy, &record) {
            Ok(command) => self.dispatch(&command).await,
            Err(e) => {
                warn!(
                    "Ignoring record #{} ({} bytes): {}",
                    session.decoded(),
                    record.len(),
                    e
                );
                None
            }
        }
    }
}

/// Text of a `show-playing` reply.
pub fn playing_reply(title: Option<String>) -> String {
    match title {
        Some(title) if !title.is_empty() => title.replace('\0', ""),
        _ => NO_VALUE_REPLY.to_string(),
    }
}

/// Text of a `show-volume` reply: whole percent, clamped to `0..=100`.
pub fn volume_reply(volume: Option<f64>) -> String {
    match volume {
        Some(v) if v.is_finite() => format!("{}", (v.clamp(0.0, 1.0) * 100.0).round() as u8),
        _ => NO_VALUE_REPLY.to_string(),
    }
}
