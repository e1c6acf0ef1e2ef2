//! NUL-terminated record framing
//!
//! Wire format: each record is an arbitrary byte string without `0x00`,
//! followed by a single `0x00`. There is no length prefix; a reader finds
//! boundaries only by scanning for the terminator, so reassembly must not
//! care how the stream was split into reads.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use solo_core::prelude::*;

/// Record terminator on the wire.
pub const TERMINATOR: u8 = 0;

/// Size of each read from the socket.
const READ_CHUNK_SIZE: usize = 1024;

/// Reject records that would be split by the terminator.
pub fn validate_record(record: &[u8]) -> Result<()> {
    match record.iter().position(|&b| b == TERMINATOR) {
        Some(offset) => Err(Error::EmbeddedTerminator { offset }),
        None => Ok(()),
    }
}

/// Frame a record for the wire: `record ++ [0x00]`.
pub fn frame(record: &[u8]) -> Result<Vec<u8>> {
    validate_record(record)?;
    let mut framed = Vec::with_capacity(record.len() + 1);
    framed.extend_from_slice(record);
    framed.push(TERMINATOR);
    Ok(framed)
}

/// Incremental record reassembly.
///
/// Bytes are fed in whatever chunks the transport produced; complete
/// records are split off as soon as their terminator arrives and the
/// unterminated tail is kept until more bytes come in.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    partial: Vec<u8>,
    complete: VecDeque<Vec<u8>>,
    buffered: usize,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the stream.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffered += chunk.len();

        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == TERMINATOR) {
            let mut record = std::mem::take(&mut self.partial);
            record.extend_from_slice(&rest[..pos]);
            self.complete.push_back(record);
            rest = &rest[pos + 1..];
        }
        self.partial.extend_from_slice(rest);
    }

    /// Pop the oldest complete record.
    pub fn next_record(&mut self) -> Option<Vec<u8>> {
        let record = self.complete.pop_front()?;
        self.buffered -= record.len() + 1;
        Some(record)
    }

    /// Bytes currently held, complete records and partial tail included.
    pub fn buffered_len(&self) -> usize {
        self.buffered
    }

    /// Length of the unterminated tail.
    pub fn partial_len(&self) -> usize {
        self.partial.len()
    }

    /// End of stream: hand back every complete record in order.
    ///
    /// Bytes after the last terminator are not a record; only their count
    /// survives, so the caller can report the truncation.
    pub fn finish(mut self) -> Reassembled {
        let truncated = self.partial.len();
        Reassembled {
            records: self.complete.drain(..).collect(),
            truncated,
        }
    }
}

/// Records recovered from one finished stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reassembled {
    pub records: Vec<Vec<u8>>,
    /// Trailing bytes that never saw a terminator (dropped).
    pub truncated: usize,
}

/// Bounds applied while reading one connection.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    /// Longest wait for the next chunk before giving up on the peer.
    pub idle_timeout: Duration,
    /// Most bytes buffered for one connection.
    pub max_bytes: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5),
            max_bytes: 1024 * 1024,
        }
    }
}

/// Why reading a stream stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// Peer closed its write side.
    Eof,
    /// Read failed; treated as end of data.
    Failed(String),
    /// No data for longer than the idle timeout.
    TimedOut,
    /// Peer sent more than the buffer limit.
    TooLarge,
}

/// Result of [`read_records`].
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub reassembled: Reassembled,
    pub end: StreamEnd,
}

/// Read a stream until it ends and reassemble its records.
///
/// Never fails: every way a stream can stop is reported in
/// [`ReadOutcome::end`] together with whatever complete records arrived
/// before it.
pub async fn read_records<R>(reader: &mut R, limits: ReadLimits) -> ReadOutcome
where
    R: AsyncRead + Unpin,
{
    let mut decoder = RecordDecoder::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];

    let end = loop {
        match tokio::time::timeout(limits.idle_timeout, reader.read(&mut buf)).await {
            Err(_) => break StreamEnd::TimedOut,
            Ok(Ok(0)) => break StreamEnd::Eof,
            Ok(Ok(n)) => {
                trace!("read {} bytes", n);
                decoder.feed(&buf[..n]);
                if decoder.buffered_len() > limits.max_bytes {
                    break StreamEnd::TooLarge;
                }
            }
            Ok(Err(e)) => break StreamEnd::Failed(e.to_string()),
        }
    };

    ReadOutcome {
        reassembled: decoder.finish(),
        end,
    }
}

/// Write one framed record, retrying short writes until it is all out.
pub async fn write_record<W>(writer: &mut W, record: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let framed = frame(record)?;
    writer.write_all(&framed).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::WriteZero {
            Error::transport("peer stopped accepting data mid-record")
        } else {
            Error::transport(format!("write failed: {}", e))
        }
    })?;
    writer
        .flush()
        .await
        .map_err(|e| Error::transport(format!("flush failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(records: &[&str]) -> Vec<u8> {
        records
            .iter()
            .flat_map(|r| frame(r.as_bytes()).unwrap())
            .collect()
    }

    #[test]
    fn test_frame_appends_terminator() {
        assert_eq!(frame(b"012 ").unwrap(), b"012 \0".to_vec());
        assert_eq!(frame(b"").unwrap(), vec![0u8]);
    }

    #[test]
    fn test_frame_rejects_embedded_nul() {
        let err = frame(b"ab\0cd").unwrap_err();
        assert!(matches!(err, Error::EmbeddedTerminator { offset: 2 }));
    }

    #[test]
    fn test_decoder_single_feed() {
        let mut decoder = RecordDecoder::new();
        decoder.feed(&wire(&["one", "two", "three"]));
        let out = decoder.finish();
        assert_eq!(
            out.records,
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
        assert_eq!(out.truncated, 0);
    }

    #[test]
    fn test_decoder_any_chunking_yields_same_records() {
        let records = ["013 file:///a.mp4", "file:///b.mp4", "", "file:///c.mp4"];
        let bytes = wire(&records);
        let expected: Vec<Vec<u8>> = records.iter().map(|r| r.as_bytes().to_vec()).collect();

        for chunk_size in 1..=bytes.len() {
            let mut decoder = RecordDecoder::new();
            for chunk in bytes.chunks(chunk_size) {
                decoder.feed(chunk);
            }
            let out = decoder.finish();
            assert_eq!(out.records, expected, "chunk size {}", chunk_size);
            assert_eq!(out.truncated, 0);
        }
    }

    #[test]
    fn test_decoder_mixed_chunk_sizes() {
        let records = [
            "014 file:///videos/a.mp4",
            "file:///videos/b.mp4",
            "",
            "x",
            "file:///videos/c%20d.mp4",
        ];
        let bytes = wire(&records);
        let expected: Vec<Vec<u8>> = records.iter().map(|r| r.as_bytes().to_vec()).collect();

        for seed in 1..=64u32 {
            // xorshift32: a different run of split points per seed
            let mut state = seed;
            let mut next_len = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state % 9) as usize + 1
            };

            let mut decoder = RecordDecoder::new();
            let mut rest = &bytes[..];
            let mut splits = Vec::new();
            while !rest.is_empty() {
                let len = next_len().min(rest.len());
                let (chunk, tail) = rest.split_at(len);
                decoder.feed(chunk);
                splits.push(len);
                rest = tail;
            }

            let out = decoder.finish();
            assert_eq!(out.records, expected, "seed {} splits {:?}", seed, splits);
            assert_eq!(out.truncated, 0);
        }
    }

    #[test]
    fn test_decoder_uneven_chunks() {
        let bytes = wire(&["alpha", "beta"]);
        let mut decoder = RecordDecoder::new();
        // Split right before and right after the first terminator.
        decoder.feed(&bytes[..5]);
        assert!(decoder.next_record().is_none());
        decoder.feed(&bytes[5..6]);
        assert_eq!(decoder.next_record(), Some(b"alpha".to_vec()));
        decoder.feed(&bytes[6..]);
        assert_eq!(decoder.next_record(), Some(b"beta".to_vec()));
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn test_decoder_drops_unterminated_tail() {
        let mut decoder = RecordDecoder::new();
        decoder.feed(b"first\0sec");
        assert_eq!(decoder.partial_len(), 3);
        let out = decoder.finish();
        assert_eq!(out.records, vec![b"first".to_vec()]);
        assert_eq!(out.truncated, 3);
    }

    #[test]
    fn test_decoder_only_unterminated_bytes() {
        let mut decoder = RecordDecoder::new();
        decoder.feed(b"play");
        let out = decoder.finish();
        assert!(out.records.is_empty());
        assert_eq!(out.truncated, 4);
    }

    #[tokio::test]
    async fn test_read_records_across_partial_reads() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"004 ")
            .read(b"\0013 file:///a")
            .read(b".mp4\0")
            .build();

        let outcome = read_records(&mut reader, ReadLimits::default()).await;
        assert_eq!(outcome.end, StreamEnd::Eof);
        assert_eq!(
            outcome.reassembled.records,
            vec![b"004 ".to_vec(), b"013 file:///a.mp4".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_read_records_error_keeps_complete_records() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"005 \0half")
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            ))
            .build();

        let outcome = read_records(&mut reader, ReadLimits::default()).await;
        assert!(matches!(outcome.end, StreamEnd::Failed(_)));
        assert_eq!(outcome.reassembled.records, vec![b"005 ".to_vec()]);
        assert_eq!(outcome.reassembled.truncated, 4);
    }

    #[tokio::test]
    async fn test_read_records_enforces_size_limit() {
        let mut reader = tokio_test::io::Builder::new()
            .read(&[b'x'; 64])
            .build();
        let limits = ReadLimits {
            idle_timeout: Duration::from_secs(1),
            max_bytes: 16,
        };

        let outcome = read_records(&mut reader, limits).await;
        assert_eq!(outcome.end, StreamEnd::TooLarge);
        assert!(outcome.reassembled.records.is_empty());
    }

    #[tokio::test]
    async fn test_read_records_idle_timeout() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"012 \0").await.unwrap();

        let limits = ReadLimits {
            idle_timeout: Duration::from_millis(50),
            max_bytes: 1024,
        };
        let outcome = read_records(&mut server, limits).await;
        assert_eq!(outcome.end, StreamEnd::TimedOut);
        assert_eq!(outcome.reassembled.records, vec![b"012 ".to_vec()]);
        drop(client);
    }

    #[tokio::test]
    async fn test_write_record_frames_bytes() {
        let mut writer = tokio_test::io::Builder::new()
            .write(b"013 file:///a.mp4\0")
            .build();
        write_record(&mut writer, b"013 file:///a.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn test_write_record_rejects_nul() {
        let mut writer = tokio_test::io::Builder::new().build();
        let err = write_record(&mut writer, b"bad\0record").await.unwrap_err();
        assert!(matches!(err, Error::EmbeddedTerminator { offset: 3 }));
    }
}
