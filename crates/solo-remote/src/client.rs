//! Caller-side client: forward commands and ask queries

use std::path::{Path, PathBuf};
use std::time::Duration;

use solo_core::prelude::*;
use solo_transport::Caller;

use crate::batch::{plan_batches, BatchPolicy};
use crate::command::{Command, Opcode};

/// Sends commands to a running owner.
///
/// The connection won during arbitration is used for the first batch; any
/// further batch or query opens a fresh connection. Every batch is waited
/// on until the owner has dispatched it, so commands keep their order
/// across connections.
#[derive(Debug)]
pub struct RemoteClient {
    path: PathBuf,
    policy: BatchPolicy,
    timeout: Duration,
    pending: Option<Caller>,
}

impl RemoteClient {
    /// Client that connects on demand.
    pub fn new(path: impl Into<PathBuf>, policy: BatchPolicy, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            policy,
            timeout,
            pending: None,
        }
    }

    /// Client that reuses an already connected caller first.
    pub fn from_caller(caller: Caller, policy: BatchPolicy, timeout: Duration) -> Self {
        Self {
            path: caller.path().to_path_buf(),
            policy,
            timeout,
            pending: Some(caller),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn next_caller(&mut self) -> Result<Caller> {
        match self.pending.take() {
            Some(caller) => Ok(caller),
            None => Caller::connect(&self.path).await,
        }
    }

    /// Forward `commands`, one connection per planned batch.
    ///
    /// Returns the number of connections used.
    pub async fn send_commands(&mut self, commands: &[Command]) -> Result<usize> {
        let batches = plan_batches(commands, self.policy);

        for (i, batch) in batches.iter().enumerate() {
            let mut caller = self.next_caller().await?;
            for record in batch {
                caller.send(record.as_bytes()).await?;
            }
            let replies = caller.complete(self.timeout).await?;
            debug!(
                "Batch {}/{} done ({} record(s), {} reply record(s))",
                i + 1,
                batches.len(),
                batch.len(),
                replies.len()
            );
        }
        Ok(batches.len())
    }

    /// Ask the owner a query opcode and return its textual answer.
    pub async fn query(&mut self, opcode: Opcode) -> Result<String> {
        if !opcode.is_query() {
            return Err(Error::protocol(format!("'{}' is not a query", opcode)));
        }
        let command = Command::new(opcode)?;
        let caller = self.next_caller().await?;
        let reply = caller.query(command.encode().as_bytes(), self.timeout).await?;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Close an unused arbitration connection without sending anything.
    pub async fn close(mut self) -> Result<()> {
        match self.pending.take() {
            Some(caller) => caller.finish().await,
            None => Ok(()),
        }
    }
}
