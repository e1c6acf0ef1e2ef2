//! Per-connection batch interpretation
//!
//! A connection carries a batch of records. Under the default policy the
//! first record decides how the rest are read: a playlist command
//! (`enqueue`/`replace`) turns every following record into a bare file
//! argument, the way a command line like `solo --replace a.mp4 b.mp4 c.mp4`
//! is forwarded. Callers and the owner must use the same policy.

use serde::{Deserialize, Serialize};

use solo_core::prelude::*;

use crate::command::{Command, Opcode};

/// How records after the first one of a connection are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// A leading playlist command makes later records bare `enqueue`
    /// arguments.
    #[default]
    FirstOpcodeGoverns,
    /// Every record is a full command.
    OnePerRecord,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum BatchMode {
    #[default]
    Start,
    Playlist,
    Commands,
}

/// Decoding state for one connection.
#[derive(Debug, Default)]
pub struct BatchDecoder {
    mode: BatchMode,
    decoded: usize,
}

impl BatchDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next record of this connection.
    ///
    /// A first record that fails to decode leaves the connection in
    /// full-command mode.
    pub fn decode(&mut self, policy: BatchPolicy, record: &[u8]) -> Result<Command> {
        let result = match self.mode {
            BatchMode::Playlist => decode_bare_argument(record),
            BatchMode::Start | BatchMode::Commands => Command::decode(record),
        };

        if self.mode == BatchMode::Start {
            self.mode = match (&result, policy) {
                (Ok(cmd), BatchPolicy::FirstOpcodeGoverns) if cmd.opcode().is_playlist() => {
                    BatchMode::Playlist
                }
                _ => BatchMode::Commands,
            };
        }
        self.decoded += 1;
        result
    }

    /// True once a leading playlist command has been seen.
    pub fn in_playlist(&self) -> bool {
        self.mode == BatchMode::Playlist
    }

    /// Records decoded so far, failures included.
    pub fn decoded(&self) -> usize {
        self.decoded
    }
}

fn decode_bare_argument(record: &[u8]) -> Result<Command> {
    let argument = std::str::from_utf8(record)
        .map_err(|e| Error::protocol(format!("playlist entry is not UTF-8: {}", e)))?;
    Command::enqueue(argument)
}

/// Split `commands` into the records of successive connections.
///
/// Each inner vector is one connection's batch, already encoded. Under
/// [`BatchPolicy::FirstOpcodeGoverns`] a playlist command starts a batch
/// that swallows the `enqueue` commands directly after it as bare
/// arguments; the first other command opens the next batch.
pub fn plan_batches(commands: &[Command], policy: BatchPolicy) -> Vec<Vec<String>> {
    if policy == BatchPolicy::OnePerRecord {
        let all: Vec<String> = commands.iter().map(Command::encode).collect();
        return if all.is_empty() { Vec::new() } else { vec![all] };
    }

    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut playlist = false;

    for cmd in commands {
        if playlist && cmd.opcode() != Opcode::Enqueue {
            batches.push(std::mem::take(&mut current));
            playlist = false;
        }

        if current.is_empty() {
            playlist = cmd.opcode().is_playlist();
            current.push(cmd.encode());
        } else if playlist {
            current.push(cmd.argument().unwrap_or_default().to_string());
        } else {
            current.push(cmd.encode());
        }
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(op: Opcode) -> Command {
        Command::new(op).unwrap()
    }

    #[test]
    fn test_first_playlist_record_folds_rest() {
        let mut decoder = BatchDecoder::new();
        let policy = BatchPolicy::FirstOpcodeGoverns;

        let first = decoder.decode(policy, b"013 file:///a.mp4").unwrap();
        assert_eq!(first, Command::enqueue("file:///a.mp4").unwrap());
        assert!(decoder.in_playlist());

        let second = decoder.decode(policy, b"file:///b.mp4").unwrap();
        assert_eq!(second, Command::enqueue("file:///b.mp4").unwrap());

        // Looks like a command, but in a playlist batch it is a file name.
        let third = decoder.decode(policy, b"012 ").unwrap();
        assert_eq!(third, Command::enqueue("012 ").unwrap());
        assert_eq!(decoder.decoded(), 3);
    }

    #[test]
    fn test_replace_batch_enqueues_the_rest() {
        let mut decoder = BatchDecoder::new();
        let policy = BatchPolicy::FirstOpcodeGoverns;

        assert_eq!(
            decoder.decode(policy, b"014 a.mp4").unwrap().opcode(),
            Opcode::Replace
        );
        assert_eq!(
            decoder.decode(policy, b"b.mp4").unwrap().opcode(),
            Opcode::Enqueue
        );
    }

    #[test]
    fn test_non_playlist_first_record_decodes_each() {
        let mut decoder = BatchDecoder::new();
        let policy = BatchPolicy::FirstOpcodeGoverns;

        assert_eq!(decoder.decode(policy, b"004 ").unwrap(), cmd(Opcode::PlayPause));
        assert!(!decoder.in_playlist());
        assert_eq!(decoder.decode(policy, b"005 ").unwrap(), cmd(Opcode::Next));
        assert!(decoder.decode(policy, b"file:///b.mp4").is_err());
    }

    #[test]
    fn test_one_per_record_never_folds() {
        let mut decoder = BatchDecoder::new();
        let policy = BatchPolicy::OnePerRecord;

        decoder.decode(policy, b"013 a.mp4").unwrap();
        assert!(!decoder.in_playlist());
        assert!(decoder.decode(policy, b"b.mp4").is_err());
        assert_eq!(decoder.decode(policy, b"012 ").unwrap(), cmd(Opcode::Quit));
    }

    #[test]
    fn test_bad_first_record_falls_back_to_commands() {
        let mut decoder = BatchDecoder::new();
        let policy = BatchPolicy::FirstOpcodeGoverns;

        assert!(decoder.decode(policy, b"garbage").is_err());
        assert_eq!(decoder.decode(policy, b"001 ").unwrap(), cmd(Opcode::Play));
    }

    #[test]
    fn test_plan_folds_enqueues_after_replace() {
        let commands = vec![
            Command::replace("file:///a.mp4").unwrap(),
            Command::enqueue("file:///b.mp4").unwrap(),
            Command::enqueue("file:///c.mp4").unwrap(),
            cmd(Opcode::PlayPause),
            cmd(Opcode::Fullscreen),
        ];

        let batches = plan_batches(&commands, BatchPolicy::FirstOpcodeGoverns);
        assert_eq!(
            batches,
            vec![
                vec![
                    "014 file:///a.mp4".to_string(),
                    "file:///b.mp4".to_string(),
                    "file:///c.mp4".to_string(),
                ],
                vec!["004 ".to_string(), "011 ".to_string()],
            ]
        );
    }

    #[test]
    fn test_plan_round_trips_through_decoder() {
        let commands = vec![
            Command::enqueue("x.ogg").unwrap(),
            Command::enqueue("y.ogg").unwrap(),
            cmd(Opcode::Next),
            Command::enqueue("z.ogg").unwrap(),
        ];

        for policy in [BatchPolicy::FirstOpcodeGoverns, BatchPolicy::OnePerRecord] {
            let mut decoded = Vec::new();
            for batch in plan_batches(&commands, policy) {
                let mut decoder = BatchDecoder::new();
                for record in batch {
                    decoded.push(decoder.decode(policy, record.as_bytes()).unwrap());
                }
            }
            assert_eq!(decoded, commands, "policy {:?}", policy);
        }
    }

    #[test]
    fn test_plan_empty() {
        assert!(plan_batches(&[], BatchPolicy::FirstOpcodeGoverns).is_empty());
        assert!(plan_batches(&[], BatchPolicy::OnePerRecord).is_empty());
    }

    #[test]
    fn test_policy_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: BatchPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"one_per_record\"").unwrap();
        assert_eq!(w.policy, BatchPolicy::OnePerRecord);
        let w: Wrapper = toml::from_str("policy = \"first_opcode_governs\"").unwrap();
        assert_eq!(w.policy, BatchPolicy::FirstOpcodeGoverns);
    }
}
