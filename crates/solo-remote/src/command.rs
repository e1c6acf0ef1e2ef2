//! Remote command wire format
//!
//! A command travels as one record of text: a three-digit zero-padded
//! opcode, one space, then the argument (possibly empty). `quit` is
//! therefore `"012 "` and `enqueue` of a file is `"013 file:///a.mp4"`.

use std::fmt;

use solo_core::prelude::*;
use solo_transport::validate_record;

/// Width of the zero-padded opcode field.
const CODE_WIDTH: usize = 3;

/// The closed set of remote commands.
///
/// Discriminants are the wire codes. Code `000` is reserved and never
/// produced or accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Play = 1,
    Pause = 2,
    Stop = 3,
    PlayPause = 4,
    Next = 5,
    Previous = 6,
    SeekForward = 7,
    SeekBackward = 8,
    VolumeUp = 9,
    VolumeDown = 10,
    Fullscreen = 11,
    Quit = 12,
    Enqueue = 13,
    Replace = 14,
    Show = 15,
    ToggleControls = 16,
    ShowPlaying = 17,
    ShowVolume = 18,
    Up = 19,
    Down = 20,
    Left = 21,
    Right = 22,
    Select = 23,
    DvdMenu = 24,
    ZoomUp = 25,
    ZoomDown = 26,
    Eject = 27,
    PlayDvd = 28,
    Mute = 29,
    ToggleAspectRatio = 30,
    NextAngle = 31,
}

impl Opcode {
    /// Every opcode, in code order.
    pub const ALL: [Opcode; 31] = [
        Opcode::Play,
        Opcode::Pause,
        Opcode::Stop,
        Opcode::PlayPause,
        Opcode::Next,
        Opcode::Previous,
        Opcode::SeekForward,
        Opcode::SeekBackward,
        Opcode::VolumeUp,
        Opcode::VolumeDown,
        Opcode::Fullscreen,
        Opcode::Quit,
        Opcode::Enqueue,
        Opcode::Replace,
        Opcode::Show,
        Opcode::ToggleControls,
        Opcode::ShowPlaying,
        Opcode::ShowVolume,
        Opcode::Up,
        Opcode::Down,
        Opcode::Left,
        Opcode::Right,
        Opcode::Select,
        Opcode::DvdMenu,
        Opcode::ZoomUp,
        Opcode::ZoomDown,
        Opcode::Eject,
        Opcode::PlayDvd,
        Opcode::Mute,
        Opcode::ToggleAspectRatio,
        Opcode::NextAngle,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.code() == code)
    }

    /// Stable kebab-case name, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Play => "play",
            Opcode::Pause => "pause",
            Opcode::Stop => "stop",
            Opcode::PlayPause => "play-pause",
            Opcode::Next => "next",
            Opcode::Previous => "previous",
            Opcode::SeekForward => "seek-forward",
            Opcode::SeekBackward => "seek-backward",
            Opcode::VolumeUp => "volume-up",
            Opcode::VolumeDown => "volume-down",
            Opcode::Fullscreen => "fullscreen",
            Opcode::Quit => "quit",
            Opcode::Enqueue => "enqueue",
            Opcode::Replace => "replace",
            Opcode::Show => "show",
            Opcode::ToggleControls => "toggle-controls",
            Opcode::ShowPlaying => "show-playing",
            Opcode::ShowVolume => "show-volume",
            Opcode::Up => "up",
            Opcode::Down => "down",
            Opcode::Left => "left",
            Opcode::Right => "right",
            Opcode::Select => "select",
            Opcode::DvdMenu => "dvd-menu",
            Opcode::ZoomUp => "zoom-up",
            Opcode::ZoomDown => "zoom-down",
            Opcode::Eject => "eject",
            Opcode::PlayDvd => "play-dvd",
            Opcode::Mute => "mute",
            Opcode::ToggleAspectRatio => "toggle-aspect-ratio",
            Opcode::NextAngle => "next-angle",
        }
    }

    /// Enqueue and replace carry a URL or path and are useless without one.
    pub fn takes_argument(self) -> bool {
        self.is_playlist()
    }

    /// Opcodes that add to or reset the playlist.
    pub fn is_playlist(self) -> bool {
        matches!(self, Opcode::Enqueue | Opcode::Replace)
    }

    /// Opcodes answered with a reply record.
    pub fn is_query(self) -> bool {
        matches!(self, Opcode::ShowPlaying | Opcode::ShowVolume)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One remote command: an opcode and its optional argument.
///
/// Constructed only through checked constructors, so a `Command` value
/// always encodes to a valid record: no NUL in the argument, and playlist
/// opcodes always carry a non-empty one. An empty argument is stored as
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    opcode: Opcode,
    argument: Option<String>,
}

impl Command {
    /// A command without argument.
    pub fn new(opcode: Opcode) -> Result<Self> {
        if opcode.takes_argument() {
            return Err(Error::MissingArgument {
                opcode: opcode.name(),
            });
        }
        Ok(Self {
            opcode,
            argument: None,
        })
    }

    /// A command with an argument. An empty argument counts as none.
    pub fn with_argument(opcode: Opcode, argument: impl Into<String>) -> Result<Self> {
        let argument = argument.into();
        validate_record(argument.as_bytes())?;

        if argument.is_empty() {
            return Self::new(opcode);
        }
        Ok(Self {
            opcode,
            argument: Some(argument),
        })
    }

    pub fn enqueue(url: impl Into<String>) -> Result<Self> {
        Self::with_argument(Opcode::Enqueue, url)
    }

    pub fn replace(url: impl Into<String>) -> Result<Self> {
        Self::with_argument(Opcode::Replace, url)
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Wire text: `"%03d %s"`.
    pub fn encode(&self) -> String {
        format!(
            "{:0width$} {}",
            self.opcode.code(),
            self.argument.as_deref().unwrap_or(""),
            width = CODE_WIDTH
        )
    }

    /// Parse one record.
    ///
    /// Requires exactly three ASCII digits, exactly one space, and valid
    /// UTF-8 for the rest. Unknown or reserved codes are rejected.
    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() < CODE_WIDTH + 1 {
            return Err(Error::protocol(format!(
                "record too short for a command ({} bytes)",
                record.len()
            )));
        }

        let (digits, rest) = record.split_at(CODE_WIDTH);
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(Error::protocol("opcode field is not three digits"));
        }
        if rest[0] != b' ' {
            return Err(Error::protocol("missing space after opcode"));
        }

        let code = digits
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
        let opcode = Opcode::from_code(code).ok_or(Error::UnknownOpcode { code })?;

        let argument = std::str::from_utf8(&rest[1..])
            .map_err(|e| Error::protocol(format!("argument is not UTF-8: {}", e)))?;

        Self::with_argument(opcode, argument)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(arg) => write!(f, "{} {}", self.opcode, arg),
            None => write!(f, "{}", self.opcode),
        }
    }
}
