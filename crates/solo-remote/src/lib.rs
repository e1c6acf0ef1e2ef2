//! # solo-remote - Remote Command Protocol and Dispatch
//!
//! The command layer on top of [`solo_transport`]: the `"%03d %s"` command
//! codec, per-connection batch interpretation, owner-side dispatch to a
//! player, the caller-side client and the settings file.
//!
//! ## Public API
//!
//! ### Commands
//! - [`Opcode`], [`Command`] - Closed opcode set and its wire text
//! - [`BatchPolicy`], [`BatchDecoder`], [`plan_batches()`] - Batches per connection
//! - [`RemoteOptions`] - Command-line options to an ordered command list
//!
//! ### Owner side
//! - [`PlayerControl`] - What commands are forwarded to
//! - [`Dispatcher`] - [`solo_transport::MessageHandler`] over a player
//!
//! ### Caller side
//! - [`RemoteClient`] - Forward commands, ask queries
//!
//! ### Configuration
//! - [`config::load_settings()`], [`config::init_config_dir()`]

pub mod batch;
pub mod client;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod options;
pub mod player;

pub use batch::{plan_batches, BatchDecoder, BatchPolicy};
pub use client::RemoteClient;
pub use command::{Command, Opcode};
pub use config::Settings;
pub use dispatch::{playing_reply, volume_reply, Dispatcher, NO_VALUE_REPLY};
pub use options::{to_uri, RemoteOptions};
pub use player::{LocalPlayerControl, PlayerControl};
