//! Caller side of the transport: stream records to the owner

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

use solo_core::prelude::*;

use crate::framing::{read_records, write_record, ReadLimits, StreamEnd};

/// A later instance, connected to the owner.
///
/// Single use: send one batch of records (or one query), then drop or
/// [`finish`](Self::finish). The owner reads the whole stream before acting,
/// so the end of the stream is what closes the batch.
#[derive(Debug)]
pub struct Caller {
    stream: UnixStream,
    path: PathBuf,
    sent: usize,
}

impl Caller {
    pub(crate) fn new(stream: UnixStream, path: PathBuf) -> Self {
        Self {
            stream,
            path,
            sent: 0,
        }
    }

    /// Connect to a running owner without arbitrating.
    ///
    /// Used to open further batches once a process already knows it is a
    /// caller.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).await.map_err(|e| {
            Error::transport(format!("could not reach owner at {}: {}", path.display(), e))
        })?;
        Ok(Self::new(stream, path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far on this connection.
    pub fn records_sent(&self) -> usize {
        self.sent
    }

    /// Write one record followed by its terminator.
    pub async fn send(&mut self, record: &[u8]) -> Result<()> {
        write_record(&mut self.stream, record).await?;
        self.sent += 1;
        trace!("Sent record #{} ({} bytes)", self.sent, record.len());
        Ok(())
    }

    /// Close the stream, ending the batch.
    pub async fn finish(mut self) -> Result<()> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| Error::transport(format!("shutdown failed: {}", e)))?;
        debug!("Batch of {} record(s) delivered", self.sent);
        Ok(())
    }

    /// Close the write side and wait for the owner to finish the batch.
    ///
    /// The owner closes its side only after every record of the connection
    /// has been dispatched, so returning here means the batch has been
    /// acted on. Any reply records written in the meantime are returned.
    pub async fn complete(mut self, timeout: Duration) -> Result<Vec<Vec<u8>>> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| Error::transport(format!("shutdown failed: {}", e)))?;

        let limits = ReadLimits {
            idle_timeout: timeout,
            ..ReadLimits::default()
        };
        let outcome = read_records(&mut self.stream, limits).await;
        match outcome.end {
            StreamEnd::Eof => Ok(outcome.reassembled.records),
            StreamEnd::TimedOut => Err(Error::timeout("owner to finish the batch")),
            StreamEnd::Failed(reason) => Err(Error::transport(reason)),
            StreamEnd::TooLarge => Err(Error::protocol("owner reply exceeded buffer limit")),
        }
    }

    /// Send one record and wait for the owner's reply.
    ///
    /// The first reply record is returned; an owner that closes without
    /// answering yields [`Error::NoReply`].
    pub async fn query(mut self, record: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        self.send(record).await?;
        self.complete(timeout)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoReply)
    }
}
