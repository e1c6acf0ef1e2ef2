//! Settings file loading and first-run initialization

use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use solo_core::prelude::*;

use super::types::Settings;

/// Directory name under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "solo";
/// Settings file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// `<config_dir>/solo`, e.g. `~/.config/solo` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from `<config_dir>/config.toml`
///
/// Returns default settings if file doesn't exist or can't be parsed.
pub fn load_settings(config_dir: &Path) -> Settings {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create the config directory and a commented default `config.toml`
///
/// An existing file is left alone. The file is written under an exclusive
/// lock, so two first runs starting together cannot interleave their
/// writes; whichever takes the lock second finds the file already filled.
pub fn init_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    if config_path.exists() {
        return Ok(());
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config_path)
        .map_err(|e| Error::config(format!("Failed to open config.toml: {}", e)))?;

    // Blocks while another process holds the lock
    file.lock_exclusive()
        .map_err(|e| Error::config(format!("Failed to lock config.toml: {}", e)))?;

    let len = file
        .metadata()
        .map_err(|e| Error::config(format!("Failed to stat config.toml: {}", e)))?
        .len();
    if len > 0 {
        debug!("{:?} was written by another instance", config_path);
        return Ok(());
    }

    file.write_all(generate_default_config().as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
    info!("Created default config at {:?}", config_path);
    Ok(())
}

fn generate_default_config() -> String {
    r#"# solo configuration

[endpoint]
prefix = "solo"             # Socket is <directory>/.<prefix>.<user>
# directory = "/run/user/1000"  # Defaults to the home directory

[transport]
read_timeout_ms = 5000      # Owner gives up on a silent caller after this
max_message_bytes = 1048576 # Most bytes buffered per connection
query_timeout_ms = 2000     # Caller waits this long for a query reply

[remote]
# "first_opcode_governs": after a leading enqueue/replace, every further
#                         record on the connection is a bare file name
# "one_per_record":       every record is a full command
batch_policy = "first_opcode_governs"

[player]
seek_forward_secs = 60
seek_backward_secs = 15
volume_step = 0.08
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings(temp.path());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let config = r#"
[endpoint]
prefix = "media"

[remote]
batch_policy = "one_per_record"
"#;
        std::fs::write(temp.path().join(CONFIG_FILENAME), config).unwrap();

        let settings = load_settings(temp.path());
        assert_eq!(settings.endpoint.prefix, "media");
        assert_eq!(settings.remote.batch_policy, BatchPolicy::OnePerRecord);
        assert_eq!(settings.transport.read_timeout_ms, 5000);
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILENAME), "not valid toml {{{{").unwrap();

        // Should return defaults
        let settings = load_settings(temp.path());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_init_config_dir() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("solo");

        init_config_dir(&dir).unwrap();

        let content = std::fs::read_to_string(dir.join(CONFIG_FILENAME)).unwrap();
        let parsed: Settings = toml::from_str(&content).expect("Default config should be valid TOML");
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_init_config_dir_idempotent() {
        let temp = tempdir().unwrap();
        init_config_dir(temp.path()).unwrap();

        let config_path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&config_path, "[endpoint]\nprefix = \"mine\"\n").unwrap();

        init_config_dir(temp.path()).unwrap();
        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("prefix = \"mine\""));
    }

    #[test]
    fn test_init_config_dir_concurrent_first_runs() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("solo");

        let runs: Vec<_> = (0..4)
            .map(|_| {
                let dir = dir.clone();
                std::thread::spawn(move || init_config_dir(&dir))
            })
            .collect();
        for run in runs {
            run.join().unwrap().unwrap();
        }

        let content = std::fs::read_to_string(dir.join(CONFIG_FILENAME)).unwrap();
        assert_eq!(content, generate_default_config());
    }
}
