//! Owner runner: apply our own command line, then serve remote commands

use std::path::Path;

use solo_core::prelude::*;
use solo_remote::{
    playing_reply, volume_reply, Dispatcher, Opcode, PlayerControl, RemoteOptions, Settings,
};
use solo_transport::{Owner, StatsSnapshot};

use super::player::HeadlessPlayer;
use crate::app::output::print_answer;
use crate::app::signals;

/// Run as the first instance until `quit` or a termination signal.
///
/// The rendezvous socket is removed when `owner` is dropped on return.
pub async fn run_owner(
    owner: Owner,
    settings: &Settings,
    options: &RemoteOptions,
    cwd: &Path,
) -> Result<StatsSnapshot> {
    let player = HeadlessPlayer::new(settings.player.clone());

    for answer in apply_command_line(&player, options, cwd).await? {
        print_answer(&answer);
    }
    if options.is_query_only() {
        info!("Only queries were asked and no player was running");
        return Ok(StatsSnapshot::default());
    }
    if player.quit_requested() {
        info!("Quit given on the command line, not serving");
        return Ok(StatsSnapshot::default());
    }

    let dispatcher = Dispatcher::new(player.clone(), settings.remote.batch_policy);
    let shutdown = async move {
        tokio::select! {
            _ = player.wait_for_quit() => {}
            result = signals::wait_for_signal() => {
                if let Err(e) = result {
                    // Without signal handling only `quit` can stop us.
                    error!("Signal handler error: {}", e);
                    player.wait_for_quit().await;
                }
            }
        }
    };

    let stats = owner
        .serve(dispatcher, shutdown)
        .await
        .context("Owner stopped serving")?;
    info!(
        "Served {} connection(s), {} record(s), {} truncated, {} aborted",
        stats.accepted, stats.records, stats.truncated, stats.aborted
    );
    Ok(stats)
}

/// Apply our own command line to `player`, then answer its queries.
///
/// Nobody else is running, so the answers describe the player after our
/// own files and toggles took effect.
pub(crate) async fn apply_command_line(
    player: &HeadlessPlayer,
    options: &RemoteOptions,
    cwd: &Path,
) -> Result<Vec<String>> {
    if !options.is_query_only() {
        for command in options.commands(cwd)? {
            if let Err(e) = player.apply(&command).await {
                warn!("Could not apply '{}' from the command line: {}", command, e);
            }
        }
    }

    let mut answers = Vec::new();
    for query in options.queries() {
        answers.push(match query {
            Opcode::ShowPlaying => playing_reply(player.now_playing().await),
            _ => volume_reply(player.volume().await),
        });
    }
    Ok(answers)
}
