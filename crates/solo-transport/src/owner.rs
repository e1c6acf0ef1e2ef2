//! Owner side of the transport: accept connections and deliver records

use std::future::Future;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinSet;

use solo_core::prelude::*;
use solo_core::ConnectionState;

use crate::connection::TransportOptions;
use crate::framing::{read_records, write_record, StreamEnd};
use crate::handler::MessageHandler;

/// Back-off after a failed `accept` so a persistent error does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Counters kept while serving.
#[derive(Debug, Default)]
pub struct OwnerStats {
    accepted: AtomicU64,
    records: AtomicU64,
    truncated: AtomicU64,
    replies: AtomicU64,
    aborted: AtomicU64,
    active: AtomicUsize,
    closed: AtomicBool,
}

impl OwnerStats {
    /// Listening while serving, closed once [`Owner::serve`] has returned.
    pub fn state(&self) -> ConnectionState {
        if self.closed.load(Ordering::Acquire) {
            ConnectionState::Closed
        } else {
            ConnectionState::Listening {
                active: self.active.load(Ordering::Acquire),
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            replies: self.replies.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`OwnerStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections accepted.
    pub accepted: u64,
    /// Records handed to the handler.
    pub records: u64,
    /// Connections that ended with unterminated trailing bytes.
    pub truncated: u64,
    /// Reply records written back.
    pub replies: u64,
    /// Connections cut short by an error, timeout or size limit.
    pub aborted: u64,
    /// Connections being serviced right now.
    pub active: usize,
}

/// Decrements the active-connection count however the task ends.
struct ActiveGuard(Arc<OwnerStats>);

impl ActiveGuard {
    fn enter(stats: &Arc<OwnerStats>) -> Self {
        stats.active.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(stats))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Device and inode of the socket file this owner bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SocketIdentity {
    dev: u64,
    ino: u64,
}

impl SocketIdentity {
    fn of(path: &Path) -> Option<Self> {
        std::fs::symlink_metadata(path).ok().map(|meta| Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }
}

/// The first instance: holds the listening rendezvous socket.
///
/// The socket file is removed when the owner is dropped, unless another
/// owner has replaced it in the meantime. A crashed owner leaves it behind;
/// the next arbitration treats it as stale.
#[derive(Debug)]
pub struct Owner {
    path: PathBuf,
    listener: UnixListener,
    options: TransportOptions,
    stats: Arc<OwnerStats>,
    identity: Option<SocketIdentity>,
}

impl Owner {
    /// Must be called right after `listener` was bound at `path`.
    pub(crate) fn new(path: PathBuf, listener: UnixListener, options: TransportOptions) -> Self {
        let identity = SocketIdentity::of(&path);
        Self {
            path,
            listener,
            options,
            stats: Arc::new(OwnerStats::default()),
            identity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Shared counters, readable while [`serve`](Self::serve) runs.
    pub fn stats(&self) -> Arc<OwnerStats> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> ConnectionState {
        self.stats.state()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Each connection gets its own task: it is read to end of stream, then
    /// its records are passed to `handler` in order. A misbehaving caller
    /// only ever ends its own connection.
    ///
    /// On shutdown no new connections are accepted. Connections already
    /// accepted get up to [`TransportOptions::drain_timeout`] to finish;
    /// whatever is still running after that is aborted and counted in
    /// [`StatsSnapshot::aborted`]. The rendezvous path is removed when the
    /// owner is dropped on return.
    pub async fn serve<H, S>(self, handler: H, shutdown: S) -> Result<StatsSnapshot>
    where
        H: MessageHandler,
        S: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        let mut tasks = JoinSet::new();
        let mut next_id: u64 = 0;

        info!("Listening on {}", self.path.display());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Owner shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        next_id += 1;
                        self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                        debug!("Accepted connection #{}", next_id);
                        tasks.spawn(service_connection(
                            next_id,
                            stream,
                            Arc::clone(&handler),
                            self.options.clone(),
                            Arc::clone(&self.stats),
                        ));
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("Connection task failed: {}", e);
                    }
                }
            }
        }

        self.drain(&mut tasks).await;
        self.stats.closed.store(true, Ordering::Release);
        Ok(self.stats.snapshot())
    }

    /// Let accepted connections finish, then abort the rest.
    ///
    /// The listener stays open until the owner is dropped, so callers that
    /// connected but were never accepted get a reset, not a clean end of
    /// stream.
    async fn drain(&self, tasks: &mut JoinSet<()>) {
        if tasks.is_empty() {
            return;
        }

        let limit = self.options.drain_timeout;
        debug!("Waiting up to {:?} for {} connection(s)", limit, tasks.len());
        let drained = tokio::time::timeout(limit, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!("Connection task failed: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            let left = tasks.len();
            warn!("Aborting {} connection(s) still open after {:?}", left, limit);
            self.stats
                .aborted
                .fetch_add(left as u64, Ordering::Relaxed);
            tasks.shutdown().await;
        }
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        if let Some(ours) = self.identity {
            match SocketIdentity::of(&self.path) {
                None => return,
                Some(current) if current != ours => {
                    debug!(
                        "{} belongs to another owner now, leaving it",
                        self.path.display()
                    );
                    return;
                }
                Some(_) => {}
            }
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed rendezvous socket {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove rendezvous socket {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Read one connection to completion and dispatch its records.
async fn service_connection<H: MessageHandler>(
    id: u64,
    stream: UnixStream,
    handler: Arc<H>,
    options: TransportOptions,
    stats: Arc<OwnerStats>,
) {
    let _active = ActiveGuard::enter(&stats);
    let (mut reader, mut writer) = stream.into_split();

    let outcome = read_records(&mut reader, options.read_limits()).await;
    match &outcome.end {
        StreamEnd::Eof => trace!("Connection #{}: end of stream", id),
        StreamEnd::Failed(reason) => {
            warn!("Connection #{}: read failed, treating as end: {}", id, reason);
            stats.aborted.fetch_add(1, Ordering::Relaxed);
        }
        StreamEnd::TimedOut => {
            warn!(
                "Connection #{}: no data for {:?}, giving up",
                id, options.read_timeout
            );
            stats.aborted.fetch_add(1, Ordering::Relaxed);
        }
        StreamEnd::TooLarge => {
            warn!(
                "Connection #{}: more than {} bytes buffered, giving up",
                id, options.max_message_bytes
            );
            stats.aborted.fetch_add(1, Ordering::Relaxed);
        }
    }

    let reassembled = outcome.reassembled;
    if reassembled.truncated > 0 {
        warn!(
            "Connection #{}: dropping {} trailing bytes with no terminator",
            id, reassembled.truncated
        );
        stats.truncated.fetch_add(1, Ordering::Relaxed);
    }

    debug!(
        "Connection #{}: delivering {} record(s)",
        id,
        reassembled.records.len()
    );

    let mut session = H::Session::default();
    let mut can_reply = true;
    for record in reassembled.records {
        stats.records.fetch_add(1, Ordering::Relaxed);
        let Some(reply) = handler.on_message(&mut session, record).await else {
            continue;
        };
        if !can_reply {
            continue;
        }
        match write_record(&mut writer, &reply).await {
            Ok(()) => {
                stats.replies.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // Keep dispatching; the caller just won't see the answers.
                warn!("Connection #{}: could not send reply: {}", id, e);
                can_reply = false;
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        trace!("Connection #{}: shutdown: {}", id, e);
    }
}
