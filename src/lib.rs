//! solo Library
//!
//! Single-instance launcher for a media player: the first invocation owns a
//! per-user rendezvous socket, later invocations forward their command line
//! to it and exit.

// Module declarations
pub mod app;
pub mod headless;

// Re-export main entry points
pub use app::{load_config, run, run_with_settings, Forwarded, Invocation, Outcome};
