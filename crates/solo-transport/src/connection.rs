//! The arbitrated connection value and its options

use std::path::Path;
use std::time::Duration;

use solo_core::prelude::*;
use solo_core::{ConnectionState, Role};

use crate::arbitration::arbitrate;
use crate::caller::Caller;
use crate::framing::ReadLimits;
use crate::owner::Owner;
use crate::rendezvous::Endpoint;

/// Tunables for both sides of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Owner: longest silence tolerated on an accepted connection.
    pub read_timeout: Duration,
    /// Owner: most bytes buffered for one connection.
    pub max_message_bytes: usize,
    /// Caller: longest wait for a query reply.
    pub query_timeout: Duration,
    /// Owner: how long accepted connections may run on after shutdown.
    pub drain_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        let read_timeout = Duration::from_secs(5);
        Self {
            read_timeout,
            max_message_bytes: 1024 * 1024,
            query_timeout: Duration::from_secs(2),
            drain_timeout: read_timeout + Self::DRAIN_GRACE,
        }
    }
}

impl TransportOptions {
    /// Added to the read timeout to get the drain timeout, so a caller that
    /// went quiet is timed out by its reader before the drain gives up.
    pub const DRAIN_GRACE: Duration = Duration::from_secs(1);

    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            idle_timeout: self.read_timeout,
            max_bytes: self.max_message_bytes,
        }
    }
}

/// Outcome of arbitration: this process either owns the endpoint or talks
/// to the process that does.
#[derive(Debug)]
pub enum Connection {
    Owner(Owner),
    Caller(Caller),
}

impl Connection {
    /// Arbitrate for `endpoint` and return the role this process got.
    pub async fn open(endpoint: &Endpoint, options: TransportOptions) -> Result<Self> {
        arbitrate(&endpoint.path(), options).await
    }

    pub fn role(&self) -> Role {
        match self {
            Connection::Owner(_) => Role::Owner,
            Connection::Caller(_) => Role::Caller,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role().is_owner()
    }

    pub fn path(&self) -> &Path {
        match self {
            Connection::Owner(owner) => owner.path(),
            Connection::Caller(caller) => caller.path(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self {
            Connection::Owner(owner) => owner.state(),
            Connection::Caller(_) => ConnectionState::Connected,
        }
    }

    pub fn into_owner(self) -> Option<Owner> {
        match self {
            Connection::Owner(owner) => Some(owner),
            Connection::Caller(_) => None,
        }
    }

    pub fn into_caller(self) -> Option<Caller> {
        match self {
            Connection::Caller(caller) => Some(caller),
            Connection::Owner(_) => None,
        }
    }
}
