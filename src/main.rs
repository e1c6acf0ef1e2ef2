//! solo - single-instance media player launcher and remote control
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use solo::Invocation;
use solo_core::{ArbitrationStage, Error};
use solo_remote::RemoteOptions;

/// solo - play media, or tell the already running player what to do
#[derive(Parser, Debug)]
#[command(name = "solo")]
#[command(about = "Single-instance media player launcher and remote control", long_about = None)]
struct Args {
    /// Files or URLs to play
    #[arg(value_name = "FILES")]
    files: Vec<String>,

    /// Tell any running player to toggle between play and pause
    #[arg(long)]
    play_pause: bool,

    /// Tell any running player to play
    #[arg(long)]
    play: bool,

    /// Tell any running player to pause
    #[arg(long)]
    pause: bool,

    /// Tell any running player to skip to the next track
    #[arg(long)]
    next: bool,

    /// Tell any running player to skip to the previous track
    #[arg(long)]
    previous: bool,

    /// Tell any running player to seek forward
    #[arg(long)]
    seek_fwd: bool,

    /// Tell any running player to seek backward
    #[arg(long)]
    seek_bwd: bool,

    /// Tell any running player to raise the volume
    #[arg(long)]
    volume_up: bool,

    /// Tell any running player to lower the volume
    #[arg(long)]
    volume_down: bool,

    /// Tell any running player to mute or unmute
    #[arg(long)]
    mute: bool,

    /// Tell any running player to toggle fullscreen
    #[arg(long)]
    fullscreen: bool,

    /// Quit any running player
    #[arg(long)]
    quit: bool,

    /// Enqueue FILES instead of replacing the playlist
    #[arg(long)]
    enqueue: bool,

    /// Replace the playlist with FILES
    #[arg(long)]
    replace: bool,

    /// Print what the running player is playing
    #[arg(long)]
    print_playing: bool,

    /// Print the running player's volume, in percent
    #[arg(long)]
    print_volume: bool,

    /// Use this directory instead of the platform config directory
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

impl Args {
    fn into_invocation(self) -> Invocation {
        let options = RemoteOptions {
            play_pause: self.play_pause,
            play: self.play,
            pause: self.pause,
            next: self.next,
            previous: self.previous,
            seek_fwd: self.seek_fwd,
            seek_bwd: self.seek_bwd,
            volume_up: self.volume_up,
            volume_down: self.volume_down,
            mute: self.mute,
            fullscreen: self.fullscreen,
            quit: self.quit,
            enqueue: self.enqueue,
            replace: self.replace,
            print_playing: self.print_playing,
            print_volume: self.print_volume,
            files: self.files,
        };

        Invocation {
            options,
            config_dir: self.config_dir,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match solo::run(args.into_invocation()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("could not start or reach the player: {}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

fn describe(error: &Error) -> String {
    match error {
        Error::EndpointUnavailable {
            path,
            stage: ArbitrationStage::FreshBind,
            reason,
        } => format!("could not create {} ({})", path.display(), reason),
        Error::EndpointUnavailable {
            path,
            stage: ArbitrationStage::StaleRecovery,
            reason,
        } => format!(
            "{} was left behind by a previous player and could not be replaced ({})",
            path.display(),
            reason
        ),
        Error::EndpointUnavailable {
            path,
            stage: ArbitrationStage::Connect,
            reason,
        } => format!(
            "a player is running at {} but did not answer ({})",
            path.display(),
            reason
        ),
        other => other.to_string(),
    }
}
