//! Test utilities for transport types
//!
//! Provides a handler that records what it receives and helpers for
//! endpoints inside temporary directories.

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{Endpoint, MessageHandler};

/// Creates an endpoint rooted in `dir` with a fixed prefix and user.
pub fn test_endpoint(dir: &Path) -> Endpoint {
    Endpoint::new("solo-test", "tester", dir)
}

/// One delivered record, tagged with its position in the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    /// 0-based index of the record within its connection.
    pub index: usize,
    pub record: Vec<u8>,
}

/// Handler that stores every record it receives.
///
/// Records that start with `?` are answered with the rest of the record
/// reversed, so tests can exercise replies.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    delivered: Arc<Mutex<Vec<Delivered>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order.
    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Just the record bytes, in delivery order.
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.delivered().into_iter().map(|d| d.record).collect()
    }
}

impl MessageHandler for RecordingHandler {
    type Session = usize;

    async fn on_message(&self, session: &mut usize, record: Vec<u8>) -> Option<Vec<u8>> {
        let index = *session;
        *session += 1;

        let reply = record
            .strip_prefix(b"?")
            .map(|rest| rest.iter().rev().copied().collect());

        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(Delivered { index, record });
        }
        reply
    }
}
