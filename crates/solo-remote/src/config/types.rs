//! Configuration types for solo
//!
//! Defines:
//! - `Settings` - Global settings loaded from `config.toml`
//! - One sub-struct per `[section]`

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use solo_core::prelude::*;
use solo_transport::{Endpoint, TransportOptions};

use crate::batch::BatchPolicy;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub endpoint: EndpointSettings,

    #[serde(default)]
    pub transport: TransportSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub player: PlayerSettings,
}

impl Settings {
    /// Reject values that would make the transport unusable.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.endpoint.prefix;
        if prefix.is_empty() || prefix.contains('/') || prefix.contains('\0') {
            return Err(Error::ConfigInvalid {
                message: format!("endpoint.prefix {:?} is not a usable file name part", prefix),
            });
        }
        if self.transport.read_timeout_ms == 0 || self.transport.query_timeout_ms == 0 {
            return Err(Error::ConfigInvalid {
                message: "transport timeouts must be greater than zero".to_string(),
            });
        }
        if self.transport.max_message_bytes == 0 {
            return Err(Error::ConfigInvalid {
                message: "transport.max_message_bytes must be greater than zero".to_string(),
            });
        }
        if !(self.player.volume_step > 0.0 && self.player.volume_step <= 1.0) {
            return Err(Error::ConfigInvalid {
                message: format!(
                    "player.volume_step {} must be in (0, 1]",
                    self.player.volume_step
                ),
            });
        }
        Ok(())
    }

    /// Rendezvous endpoint for the invoking user.
    pub fn endpoint(&self) -> Endpoint {
        let endpoint = Endpoint::for_current_user(self.endpoint.prefix.clone());
        match &self.endpoint.directory {
            Some(dir) => endpoint.with_directory(dir.clone()),
            None => endpoint,
        }
    }

    pub fn transport_options(&self) -> TransportOptions {
        let read_timeout = Duration::from_millis(self.transport.read_timeout_ms);
        TransportOptions {
            read_timeout,
            max_message_bytes: self.transport.max_message_bytes,
            query_timeout: Duration::from_millis(self.transport.query_timeout_ms),
            drain_timeout: read_timeout + TransportOptions::DRAIN_GRACE,
        }
    }
}

/// `[endpoint]`: where owners and callers meet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointSettings {
    /// Application prefix in `.<prefix>.<user>`
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Directory holding the socket (defaults to the home directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            directory: None,
        }
    }
}

fn default_prefix() -> String {
    "solo".to_string()
}

/// `[transport]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransportSettings {
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
            max_message_bytes: default_max_message_bytes(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_read_timeout_ms() -> u64 {
    5000
}

fn default_max_message_bytes() -> usize {
    1024 * 1024
}

fn default_query_timeout_ms() -> u64 {
    2000
}

/// `[remote]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteSettings {
    /// How records after the first of a connection are read
    #[serde(default)]
    pub batch_policy: BatchPolicy,
}

/// `[player]`: tunables of the built-in headless player.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerSettings {
    #[serde(default = "default_seek_forward_secs")]
    pub seek_forward_secs: u64,

    #[serde(default = "default_seek_backward_secs")]
    pub seek_backward_secs: u64,

    /// Volume change per volume-up/down, as a fraction of full scale
    #[serde(default = "default_volume_step")]
    pub volume_step: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            seek_forward_secs: default_seek_forward_secs(),
            seek_backward_secs: default_seek_backward_secs(),
            volume_step: default_volume_step(),
        }
    }
}

fn default_seek_forward_secs() -> u64 {
    60
}

fn default_seek_backward_secs() -> u64 {
    15
}

fn default_volume_step() -> f64 {
    0.08
}
