//! # solo-transport - Single-Instance Arbitration and Record Transport
//!
//! Decides whether this process is the first instance (the **owner**) or a
//! later one (a **caller**), and moves NUL-terminated records from callers
//! to the owner over a per-user Unix socket.
//!
//! Depends on [`solo_core`] for error handling and domain types.
//!
//! ## Public API
//!
//! ### Endpoint
//! - [`rendezvous_path()`] - `<dir>/.<prefix>.<user>`, pure
//! - [`Endpoint`] - Prefix, user and directory of one rendezvous path
//!
//! ### Arbitration
//! - [`Connection::open()`] - Become owner or caller, recovering stale sockets once
//! - [`arbitrate()`] - Same, addressed by path
//!
//! ### Owner / Caller
//! - [`Owner::serve()`] - Accept loop, one task per connection
//! - [`Caller::send()`], [`Caller::complete()`] - Stream records, then wait for dispatch
//! - [`Caller::query()`] - One record, one reply
//! - [`MessageHandler`] - What the owner hands records to
//!
//! ### Framing
//! - [`RecordDecoder`] - Chunk-agnostic reassembly
//! - [`frame()`], [`read_records()`], [`write_record()`]

pub mod arbitration;
pub mod caller;
pub mod connection;
pub mod framing;
pub mod handler;
pub mod owner;
pub mod rendezvous;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

// Public API re-exports
pub use arbitration::{arbitrate, is_socket};
pub use caller::Caller;
pub use connection::{Connection, TransportOptions};
pub use framing::{
    frame, read_records, validate_record, write_record, ReadLimits, ReadOutcome, Reassembled,
    RecordDecoder, StreamEnd, TERMINATOR,
};
pub use handler::MessageHandler;
pub use owner::{Owner, OwnerStats, StatsSnapshot};
pub use rendezvous::{current_user, rendezvous_path, Endpoint};
