//! Role arbitration
//!
//! Decides at startup whether this process owns the rendezvous endpoint or
//! forwards to the process that does. The order of steps is the recovery
//! policy for owners that died without cleaning up:
//!
//! 1. Path missing, or not a socket: bind. Failure is fatal.
//! 2. Path is a socket: connect. Success makes this process a caller.
//! 3. Connect refused twice in a row, or the path vanished: the socket is
//!    stale. Remove it and bind once more. Failure is fatal; there is no
//!    further retry.
//!
//! A full accept backlog means the owner is alive but busy. Connecting is
//! retried for a short while and then given up on, without touching the
//! socket.

use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};

use solo_core::prelude::*;
use solo_core::ArbitrationStage;

use crate::caller::Caller;
use crate::connection::{Connection, TransportOptions};
use crate::owner::Owner;

/// Connection attempts made against an existing socket.
const CONNECT_ATTEMPTS: u32 = 10;

/// Pause between connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Refusals in a row before a socket counts as stale. A single refusal can
/// come from an owner that has bound but not started listening yet.
const STALE_REFUSALS: u32 = 2;

/// True when `path` exists and is a socket special file.
///
/// Follows symlinks, like `stat(2)`.
pub fn is_socket(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.file_type().is_socket())
        .unwrap_or(false)
}

/// Arbitrate for the endpoint at `path`.
pub async fn arbitrate(path: &Path, options: TransportOptions) -> Result<Connection> {
    if !is_socket(path) {
        debug!("No socket at {}, trying to become owner", path.display());
        return become_owner(path, options, ArbitrationStage::FreshBind);
    }

    match probe_owner(path).await {
        Probe::Live(stream) => {
            info!("Owner found at {}, acting as caller", path.display());
            Ok(Connection::Caller(Caller::new(stream, path.to_path_buf())))
        }
        Probe::Stale(e) => {
            warn!(
                "Stale endpoint at {} ({}), removing and taking over",
                path.display(),
                e
            );
            if let Err(e) = remove_stale(path) {
                return Err(Error::endpoint_unavailable(
                    path,
                    ArbitrationStage::StaleRecovery,
                    format!("could not remove stale socket: {}", e),
                ));
            }
            become_owner(path, options, ArbitrationStage::StaleRecovery)
        }
        Probe::Unreachable(e) => Err(Error::endpoint_unavailable(
            path,
            ArbitrationStage::Connect,
            e.to_string(),
        )),
    }
}

/// What connecting to an existing socket says about its owner.
#[derive(Debug)]
enum Probe {
    Live(UnixStream),
    /// Nobody is listening; safe to replace.
    Stale(io::Error),
    /// Someone may be listening but the connection never went through.
    Unreachable(io::Error),
}

async fn probe_owner(path: &Path) -> Probe {
    let mut refusals = 0;
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match UnixStream::connect(path).await {
            Ok(stream) => return Probe::Live(stream),
            Err(e) => e,
        };

        match err.kind() {
            io::ErrorKind::NotFound => return Probe::Stale(err),
            io::ErrorKind::ConnectionRefused => {
                refusals += 1;
                if refusals >= STALE_REFUSALS {
                    return Probe::Stale(err);
                }
            }
            // Backlog full
            io::ErrorKind::WouldBlock => refusals = 0,
            _ => return Probe::Unreachable(err),
        }

        if attempt >= CONNECT_ATTEMPTS {
            return Probe::Unreachable(err);
        }
        trace!(
            "Connect to {} failed ({}), attempt {}/{}",
            path.display(),
            err,
            attempt,
            CONNECT_ATTEMPTS
        );
        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
    }
}

fn remove_stale(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn become_owner(
    path: &Path,
    options: TransportOptions,
    stage: ArbitrationStage,
) -> Result<Connection> {
    let listener = UnixListener::bind(path)
        .map_err(|e| Error::endpoint_unavailable(path, stage, e.to_string()))?;
    info!("Became owner of {}", path.display());
    Ok(Connection::Owner(Owner::new(
        path.to_path_buf(),
        listener,
        options,
    )))
}
