//! Message handler seam between the transport and whatever interprets records

use std::future::Future;

/// Receives the records of every accepted connection.
///
/// The owner calls [`on_message`](MessageHandler::on_message) once per
/// record, strictly in the order the records arrived on that connection.
/// A fresh [`Session`](MessageHandler::Session) is created per connection, so
/// a handler can give the first record of a connection a different meaning
/// from the rest.
///
/// Returning `Some(reply)` writes `reply` back to the same connection as a
/// framed record; this is how query commands answer their caller.
pub trait MessageHandler: Send + Sync + 'static {
    /// Per-connection state.
    type Session: Default + Send;

    fn on_message(
        &self,
        session: &mut Self::Session,
        record: Vec<u8>,
    ) -> impl Future<Output = Option<Vec<u8>>> + Send;
}
