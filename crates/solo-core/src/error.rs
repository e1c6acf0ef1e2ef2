//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ArbitrationStage;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Startup error: {message}")]
    Startup { message: String },

    // ─────────────────────────────────────────────────────────────
    // Arbitration Errors
    // ─────────────────────────────────────────────────────────────
    /// Neither "become owner" nor "become caller" worked for this path.
    #[error("Rendezvous endpoint {path} unavailable ({stage}): {reason}")]
    EndpointUnavailable {
        path: PathBuf,
        stage: ArbitrationStage,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Record contains a NUL byte at offset {offset}")]
    EmbeddedTerminator { offset: usize },

    #[error("Timed out waiting for {what}")]
    Timeout { what: String },

    #[error("Owner closed the connection without replying")]
    NoReply,

    // ─────────────────────────────────────────────────────────────
    // Protocol Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Remote command protocol error: {message}")]
    Protocol { message: String },

    #[error("Unknown remote opcode: {code:03}")]
    UnknownOpcode { code: u16 },

    #[error("Opcode '{opcode}' requires an argument")]
    MissingArgument { opcode: &'static str },

    // ─────────────────────────────────────────────────────────────
    // Player Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Player error: {message}")]
    Player { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn endpoint_unavailable(
        path: impl Into<PathBuf>,
        stage: ArbitrationStage,
        reason: impl Into<String>,
    ) -> Self {
        Self::EndpointUnavailable {
            path: path.into(),
            stage,
            reason: reason.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout { what: what.into() }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn player(message: impl Into<String>) -> Self {
        Self::Player {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    /// The arbitration stage that failed, if this is an arbitration error.
    pub fn arbitration_stage(&self) -> Option<ArbitrationStage> {
        match self {
            Error::EndpointUnavailable { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors are local to one connection or one record; the
    /// owner keeps serving after them.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. }
                | Error::EmbeddedTerminator { .. }
                | Error::Timeout { .. }
                | Error::NoReply
                | Error::Protocol { .. }
                | Error::UnknownOpcode { .. }
                | Error::MissingArgument { .. }
                | Error::Player { .. }
        )
    }

    /// Check if this error should terminate the process
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::EndpointUnavailable { .. } | Error::Startup { .. } | Error::ConfigInvalid { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::transport("broken pipe");
        assert_eq!(err.to_string(), "Transport error: broken pipe");

        let err = Error::UnknownOpcode { code: 7 };
        assert_eq!(err.to_string(), "Unknown remote opcode: 007");
    }

    #[test]
    fn test_endpoint_unavailable_mentions_stage() {
        let err = Error::endpoint_unavailable(
            "/home/alice/.solo.alice",
            ArbitrationStage::StaleRecovery,
            "permission denied",
        );
        let msg = err.to_string();
        assert!(msg.contains("/home/alice/.solo.alice"));
        assert!(msg.contains("stale"));
        assert!(msg.contains("permission denied"));
        assert_eq!(
            err.arbitration_stage(),
            Some(ArbitrationStage::StaleRecovery)
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.arbitration_stage(), None);
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(
            Error::endpoint_unavailable("/tmp/x", ArbitrationStage::FreshBind, "denied").is_fatal()
        );
        assert!(!Error::protocol("bad digits").is_fatal());
        assert!(!Error::NoReply.is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::protocol("bad digits").is_recoverable());
        assert!(Error::transport("reset").is_recoverable());
        assert!(Error::UnknownOpcode { code: 999 }.is_recoverable());
        assert!(Error::MissingArgument { opcode: "enqueue" }.is_recoverable());
        assert!(
            !Error::endpoint_unavailable("/tmp/x", ArbitrationStage::FreshBind, "denied")
                .is_recoverable()
        );
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::transport("test");
        let _ = Error::timeout("test");
        let _ = Error::protocol("test");
        let _ = Error::player("test");
        let _ = Error::config("test");
        let _ = Error::startup("test");
    }

    #[test]
    fn test_result_ext_keeps_error() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io.context("opening socket").unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        let ok: Result<u8> = Ok(3);
        assert_eq!(ok.with_context(|| unreachable!()).unwrap(), 3);
    }
}
