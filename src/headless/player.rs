//! Headless player: the state a first instance keeps without a media engine
//!
//! Tracks playlist, position, volume and view flags so remote commands have
//! a visible effect and queries have something to answer. No media is
//! decoded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;

use solo_core::prelude::*;
use solo_remote::config::PlayerSettings;
use solo_remote::{Command, Opcode, PlayerControl};

/// `previous` restarts the current item instead once playback is past this.
const RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// Zoom limits and step, in percent.
const ZOOM_MIN: u32 = 10;
const ZOOM_MAX: u32 = 400;
const ZOOM_STEP: u32 = 10;

/// URL used by `play-dvd`.
const DVD_URL: &str = "dvd://";

/// Display aspect ratio, cycled by `toggle-aspect-ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Auto,
    Square,
    FourThree,
    Anamorphic,
    Dvb,
}

impl AspectRatio {
    fn next(self) -> Self {
        match self {
            AspectRatio::Auto => AspectRatio::Square,
            AspectRatio::Square => AspectRatio::FourThree,
            AspectRatio::FourThree => AspectRatio::Anamorphic,
            AspectRatio::Anamorphic => AspectRatio::Dvb,
            AspectRatio::Dvb => AspectRatio::Auto,
        }
    }
}

/// Snapshot of everything the headless player tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub playlist: Vec<String>,
    pub current: Option<usize>,
    pub playing: bool,
    pub position: Duration,
    /// `0.0..=1.0`
    pub volume: f64,
    pub muted: bool,
    pub fullscreen: bool,
    pub controls_visible: bool,
    /// Times the player was asked to raise itself.
    pub shown: u32,
    pub zoom: u32,
    pub aspect_ratio: AspectRatio,
    pub angle: u32,
    /// Last menu navigation command received.
    pub last_navigation: Option<Opcode>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            playlist: Vec::new(),
            current: None,
            playing: false,
            position: Duration::ZERO,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            controls_visible: true,
            shown: 0,
            zoom: 100,
            aspect_ratio: AspectRatio::Auto,
            angle: 0,
            last_navigation: None,
        }
    }
}

impl PlayerState {
    fn current_item(&self) -> Option<&str> {
        self.current
            .and_then(|i| self.playlist.get(i))
            .map(String::as_str)
    }

    fn select(&mut self, index: usize) {
        self.current = Some(index);
        self.position = Duration::ZERO;
    }

    fn start_playing(&mut self) -> Result<()> {
        if self.current.is_none() {
            if self.playlist.is_empty() {
                return Err(Error::player("playlist is empty"));
            }
            self.select(0);
        }
        self.playing = true;
        Ok(())
    }
}

/// Cloneable handle; clones share state.
#[derive(Debug, Clone)]
pub struct HeadlessPlayer {
    state: Arc<Mutex<PlayerState>>,
    settings: PlayerSettings,
    quit_requested: Arc<AtomicBool>,
    quit: Arc<Notify>,
}

impl HeadlessPlayer {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState::default())),
            settings,
            quit_requested: Arc::new(AtomicBool::new(false)),
            quit: Arc::new(Notify::new()),
        }
    }

    pub fn snapshot(&self) -> PlayerState {
        self.lock().clone()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::Acquire)
    }

    /// Resolves once `quit` has been applied, even if that happened before
    /// this was called.
    pub async fn wait_for_quit(&self) {
        if self.quit_requested() {
            return;
        }
        self.quit.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply a command to the state. Synchronous; the async trait method
    /// wraps it.
    fn apply_now(&self, command: &Command) -> Result<()> {
        let mut state = self.lock();
        let current = state.current;

        match command.opcode() {
            Opcode::Play => state.start_playing()?,
            Opcode::Pause => state.playing = false,
            Opcode::Stop => {
                state.playing = false;
                state.position = Duration::ZERO;
            }
            Opcode::PlayPause => {
                if state.playing {
                    state.playing = false;
                } else {
                    state.start_playing()?;
                }
            }
            Opcode::Next => match current {
                Some(i) if i + 1 < state.playlist.len() => state.select(i + 1),
                _ => debug!("Already at the end of the playlist"),
            },
            Opcode::Previous => match current {
                Some(i) if i > 0 && state.position <= RESTART_THRESHOLD => state.select(i - 1),
                Some(_) => state.position = Duration::ZERO,
                None => debug!("Nothing loaded"),
            },
            Opcode::SeekForward => {
                if state.current.is_some() {
                    state.position += Duration::from_secs(self.settings.seek_forward_secs);
                }
            }
            Opcode::SeekBackward => {
                state.position = state
                    .position
                    .saturating_sub(Duration::from_secs(self.settings.seek_backward_secs));
            }
            Opcode::VolumeUp => {
                state.volume = (state.volume + self.settings.volume_step).min(1.0);
                state.muted = false;
            }
            Opcode::VolumeDown => {
                state.volume = (state.volume - self.settings.volume_step).max(0.0);
            }
            Opcode::Mute => state.muted = !state.muted,
            Opcode::Fullscreen => state.fullscreen = !state.fullscreen,
            Opcode::ToggleControls => state.controls_visible = !state.controls_visible,
            Opcode::Show => state.shown += 1,
            Opcode::Quit => {
                drop(state);
                info!("Quit requested");
                self.quit_requested.store(true, Ordering::Release);
                self.quit.notify_one();
            }
            Opcode::Enqueue => {
                let url = required_argument(command)?;
                state.playlist.push(url);
                if state.current.is_none() {
                    let last = state.playlist.len() - 1;
                    state.select(last);
                }
            }
            Opcode::Replace => {
                let url = required_argument(command)?;
                state.playlist = vec![url];
                state.select(0);
                state.playing = true;
            }
            Opcode::PlayDvd => {
                state.playlist = vec![DVD_URL.to_string()];
                state.select(0);
                state.playing = true;
            }
            Opcode::Eject => {
                state.playing = false;
                state.current = None;
                state.position = Duration::ZERO;
            }
            Opcode::Up
            | Opcode::Down
            | Opcode::Left
            | Opcode::Right
            | Opcode::Select
            | Opcode::DvdMenu => state.last_navigation = Some(command.opcode()),
            Opcode::ZoomUp => state.zoom = (state.zoom + ZOOM_STEP).min(ZOOM_MAX),
            Opcode::ZoomDown => state.zoom = state.zoom.saturating_sub(ZOOM_STEP).max(ZOOM_MIN),
            Opcode::ToggleAspectRatio => state.aspect_ratio = state.aspect_ratio.next(),
            Opcode::NextAngle => state.angle = state.angle.wrapping_add(1),
            Opcode::ShowPlaying | Opcode::ShowVolume => {}
        }

        trace!("Applied {}", command);
        Ok(())
    }
}

fn required_argument(command: &Command) -> Result<String> {
    command
        .argument()
        .map(str::to_string)
        .ok_or(Error::MissingArgument {
            opcode: command.opcode().name(),
        })
}

impl PlayerControl for HeadlessPlayer {
    async fn apply(&self, command: &Command) -> Result<()> {
        self.apply_now(command)
    }

    async fn now_playing(&self) -> Option<String> {
        self.lock().current_item().map(str::to_string)
    }

    async fn volume(&self) -> Option<f64> {
        Some(self.lock().volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> HeadlessPlayer {
        HeadlessPlayer::new(PlayerSettings::default())
    }

    fn cmd(op: Opcode) -> Command {
        Command::new(op).unwrap()
    }

    #[tokio::test]
    async fn test_replace_then_enqueue() {
        let p = player();
        p.apply(&Command::replace("file:///a.mp4").unwrap()).await.unwrap();
        p.apply(&Command::enqueue("file:///b.mp4").unwrap()).await.unwrap();

        let state = p.snapshot();
        assert_eq!(state.playlist, vec!["file:///a.mp4", "file:///b.mp4"]);
        assert_eq!(state.current, Some(0));
        assert!(state.playing);
        assert_eq!(p.now_playing().await.as_deref(), Some("file:///a.mp4"));
    }

    #[tokio::test]
    async fn test_play_with_empty_playlist_fails() {
        let p = player();
        let err = p.apply(&cmd(Opcode::Play)).await.unwrap_err();
        assert!(matches!(err, Error::Player { .. }));
        assert!(p.now_playing().await.is_none());
    }

    #[tokio::test]
    async fn test_play_pause_toggles() {
        let p = player();
        p.apply(&Command::enqueue("a.ogg").unwrap()).await.unwrap();
        assert!(!p.snapshot().playing);

        p.apply(&cmd(Opcode::PlayPause)).await.unwrap();
        assert!(p.snapshot().playing);
        p.apply(&cmd(Opcode::PlayPause)).await.unwrap();
        assert!(!p.snapshot().playing);
    }

    #[tokio::test]
    async fn test_seek_offsets() {
        let p = player();
        p.apply(&Command::replace("a.ogg").unwrap()).await.unwrap();
        p.apply(&cmd(Opcode::SeekForward)).await.unwrap();
        assert_eq!(p.snapshot().position, Duration::from_secs(60));
        p.apply(&cmd(Opcode::SeekBackward)).await.unwrap();
        assert_eq!(p.snapshot().position, Duration::from_secs(45));
        for _ in 0..5 {
            p.apply(&cmd(Opcode::SeekBackward)).await.unwrap();
        }
        assert_eq!(p.snapshot().position, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_volume_steps_and_clamps() {
        let p = player();
        p.apply(&cmd(Opcode::VolumeUp)).await.unwrap();
        assert_eq!(p.volume().await, Some(1.0));

        p.apply(&cmd(Opcode::VolumeDown)).await.unwrap();
        let v = p.volume().await.unwrap();
        assert!((v - 0.92).abs() < 1e-9);

        for _ in 0..20 {
            p.apply(&cmd(Opcode::VolumeDown)).await.unwrap();
        }
        assert_eq!(p.volume().await, Some(0.0));
    }

    #[tokio::test]
    async fn test_next_previous() {
        let p = player();
        p.apply(&Command::replace("a").unwrap()).await.unwrap();
        p.apply(&Command::enqueue("b").unwrap()).await.unwrap();

        p.apply(&cmd(Opcode::Next)).await.unwrap();
        assert_eq!(p.snapshot().current, Some(1));
        p.apply(&cmd(Opcode::Next)).await.unwrap();
        assert_eq!(p.snapshot().current, Some(1));

        p.apply(&cmd(Opcode::SeekForward)).await.unwrap();
        p.apply(&cmd(Opcode::Previous)).await.unwrap();
        // Past the threshold: restart the item first.
        assert_eq!(p.snapshot().current, Some(1));
        assert_eq!(p.snapshot().position, Duration::ZERO);
        p.apply(&cmd(Opcode::Previous)).await.unwrap();
        assert_eq!(p.snapshot().current, Some(0));
    }

    #[tokio::test]
    async fn test_view_toggles() {
        let p = player();
        for op in [
            Opcode::Fullscreen,
            Opcode::ToggleControls,
            Opcode::Mute,
            Opcode::Show,
            Opcode::ZoomUp,
            Opcode::ToggleAspectRatio,
            Opcode::NextAngle,
            Opcode::DvdMenu,
        ] {
            p.apply(&cmd(op)).await.unwrap();
        }
        let state = p.snapshot();
        assert!(state.fullscreen);
        assert!(!state.controls_visible);
        assert!(state.muted);
        assert_eq!(state.shown, 1);
        assert_eq!(state.zoom, 110);
        assert_eq!(state.aspect_ratio, AspectRatio::Square);
        assert_eq!(state.angle, 1);
        assert_eq!(state.last_navigation, Some(Opcode::DvdMenu));
    }

    #[tokio::test]
    async fn test_play_dvd_and_eject() {
        let p = player();
        p.apply(&cmd(Opcode::PlayDvd)).await.unwrap();
        assert_eq!(p.now_playing().await.as_deref(), Some(DVD_URL));
        p.apply(&cmd(Opcode::Eject)).await.unwrap();
        assert!(p.now_playing().await.is_none());
        assert!(!p.snapshot().playing);
    }

    #[tokio::test]
    async fn test_quit_wakes_waiter() {
        let p = player();
        let waiter = {
            let p = p.clone();
            tokio::spawn(async move { p.wait_for_quit().await })
        };
        p.apply(&cmd(Opcode::Quit)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("quit should wake the waiter")
            .unwrap();
        assert!(p.quit_requested());
        // Already quit: returns immediately.
        p.wait_for_quit().await;
    }
}
