//! Caller runner: forward our command line to the running owner

use std::path::Path;

use solo_core::prelude::*;
use solo_remote::{RemoteClient, RemoteOptions, Settings};
use solo_transport::Caller;

use super::output::print_answer;

/// What a caller did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forwarded {
    /// Connections used for commands.
    pub batches: usize,
    /// Query answers, in the order they were printed.
    pub answers: Vec<String>,
}

/// Send the commands and queries for `options` to the owner, reusing the
/// arbitration connection for the first of them.
pub async fn run_caller(
    caller: Caller,
    settings: &Settings,
    options: &RemoteOptions,
    cwd: &Path,
) -> Result<Forwarded> {
    let timeout = settings.transport_options().query_timeout;
    let mut client = RemoteClient::from_caller(caller, settings.remote.batch_policy, timeout);
    let mut forwarded = Forwarded::default();

    if !options.is_query_only() {
        let commands = options.commands(cwd)?;
        debug!("Forwarding {} command(s)", commands.len());
        forwarded.batches = client.send_commands(&commands).await?;
    }

    for query in options.queries() {
        let answer = client.query(query).await?;
        print_answer(&answer);
        forwarded.answers.push(answer);
    }

    client.close().await?;
    info!(
        "Forwarded {} batch(es), {} answer(s)",
        forwarded.batches,
        forwarded.answers.len()
    );
    Ok(forwarded)
}
