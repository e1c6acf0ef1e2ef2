//! Core domain types shared by the transport and remote-command layers

use std::fmt;

/// Which side of the rendezvous endpoint this process ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// First instance: holds the listening endpoint.
    Owner,
    /// Later instance: connected to the owner, forwards its commands and exits.
    Caller,
}

impl Role {
    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Caller => write!(f, "caller"),
        }
    }
}

/// The arbitration step that failed when no role could be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArbitrationStage {
    /// No socket existed and binding a new one failed.
    FreshBind,
    /// A socket existed, nobody answered, and re-binding after removing it failed.
    StaleRecovery,
    /// A socket existed and is alive, but the owner would not take the connection.
    Connect,
}

impl fmt::Display for ArbitrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbitrationStage::FreshBind => write!(f, "could not create listener"),
            ArbitrationStage::StaleRecovery => {
                write!(f, "stale endpoint could not be replaced")
            }
            ArbitrationStage::Connect => write!(f, "running owner could not be reached"),
        }
    }
}

/// Lifecycle of a connection value.
///
/// `{Listening | Connected} → Closed`. There is no value before arbitration
/// has picked a role. A listening owner alternates between idle and
/// servicing while connections come and go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Listening {
        /// Accepted connections currently being read or answered.
        active: usize,
    },
    Connected,
    Closed,
}

impl ConnectionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConnectionState::Listening { active: 0 })
    }

    pub fn is_servicing(&self) -> bool {
        matches!(self, ConnectionState::Listening { active } if *active > 0)
    }
}
