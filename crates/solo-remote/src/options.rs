//! Command-line options to remote commands
//!
//! Turns what the user asked for on the command line into the ordered
//! command list a caller forwards to the owner (or the owner applies to
//! itself on first start).

use std::path::Path;

use url::Url;

use solo_core::prelude::*;

use crate::command::{Command, Opcode};

/// Remote-control options as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOptions {
    pub play_pause: bool,
    pub play: bool,
    pub pause: bool,
    pub next: bool,
    pub previous: bool,
    pub seek_fwd: bool,
    pub seek_bwd: bool,
    pub volume_up: bool,
    pub volume_down: bool,
    pub mute: bool,
    pub fullscreen: bool,
    pub quit: bool,
    pub enqueue: bool,
    pub replace: bool,
    pub print_playing: bool,
    pub print_volume: bool,
    /// Files or URLs, in command-line order.
    pub files: Vec<String>,
}

impl RemoteOptions {
    /// Ordered commands for these options.
    ///
    /// - `quit` wins over everything else.
    /// - The first file uses the playlist action (replace unless only
    ///   `--enqueue` was given); later files are always enqueued.
    /// - Toggles follow in a fixed order.
    /// - With no toggle at all, `show` is appended.
    ///
    /// Relative paths are resolved against `cwd` and sent as `file://`
    /// URLs. Queries are not included; see [`queries`](Self::queries).
    pub fn commands(&self, cwd: &Path) -> Result<Vec<Command>> {
        if self.quit {
            return Ok(vec![Command::new(Opcode::Quit)?]);
        }

        let mut commands = Vec::new();

        let mut action = self.playlist_action();
        for file in &self.files {
            commands.push(Command::with_argument(action, to_uri(file, cwd))?);
            action = Opcode::Enqueue;
        }

        let toggles = self.toggles();
        if toggles.is_empty() {
            commands.push(Command::new(Opcode::Show)?);
        } else {
            for opcode in toggles {
                commands.push(Command::new(opcode)?);
            }
        }
        Ok(commands)
    }

    /// Query opcodes requested, in the order their answers are printed.
    pub fn queries(&self) -> Vec<Opcode> {
        let mut queries = Vec::new();
        if self.print_playing {
            queries.push(Opcode::ShowPlaying);
        }
        if self.print_volume {
            queries.push(Opcode::ShowVolume);
        }
        queries
    }

    /// True when only queries were asked for; such an invocation must not
    /// nudge the player with `show`.
    pub fn is_query_only(&self) -> bool {
        !self.queries().is_empty() && self.files.is_empty() && self.toggles().is_empty() && !self.quit
    }

    fn playlist_action(&self) -> Opcode {
        match (self.enqueue, self.replace) {
            (true, true) => {
                warn!("Can't enqueue and replace at the same time, replacing");
                Opcode::Replace
            }
            (true, false) => Opcode::Enqueue,
            _ => Opcode::Replace,
        }
    }

    fn toggles(&self) -> Vec<Opcode> {
        [
            (self.play_pause, Opcode::PlayPause),
            (self.play, Opcode::Play),
            (self.pause, Opcode::Pause),
            (self.next, Opcode::Next),
            (self.previous, Opcode::Previous),
            (self.seek_fwd, Opcode::SeekForward),
            (self.seek_bwd, Opcode::SeekBackward),
            (self.volume_up, Opcode::VolumeUp),
            (self.volume_down, Opcode::VolumeDown),
            (self.mute, Opcode::Mute),
            (self.fullscreen, Opcode::Fullscreen),
        ]
        .into_iter()
        .filter_map(|(set, opcode)| set.then_some(opcode))
        .collect()
    }
}

/// URL for a command-line file argument.
///
/// Anything that already parses as a URL is kept; paths become absolute
/// `file://` URLs. If that conversion fails the argument is sent as given.
pub fn to_uri(file: &str, cwd: &Path) -> String {
    if Url::parse(file).is_ok() {
        return file.to_string();
    }

    let path = Path::new(file);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    match Url::from_file_path(&absolute) {
        Ok(url) => url.to_string(),
        Err(()) => {
            debug!("Could not turn {} into a file URL", absolute.display());
            file.to_string()
        }
    }
}
