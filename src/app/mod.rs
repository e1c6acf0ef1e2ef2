//! Application layer - arbitration and role dispatch

pub mod caller;
pub mod output;
pub mod signals;

use std::path::{Path, PathBuf};

use solo_core::prelude::*;
use solo_core::{logging, Role};
use solo_remote::config::{default_config_dir, init_config_dir, load_settings};
use solo_remote::{RemoteOptions, Settings};
use solo_transport::{Connection, StatsSnapshot};

pub use caller::Forwarded;

/// One invocation of the program.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub options: RemoteOptions,
    /// Overrides the platform config directory.
    pub config_dir: Option<PathBuf>,
    /// Base for relative file arguments.
    pub cwd: PathBuf,
}

/// How the invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// We were the first instance and served until quit.
    Owned(StatsSnapshot),
    /// Another instance was running; our commands went to it.
    Forwarded(Forwarded),
}

impl Outcome {
    pub fn role(&self) -> Role {
        match self {
            Outcome::Owned(_) => Role::Owner,
            Outcome::Forwarded(_) => Role::Caller,
        }
    }
}

/// Main application entry point
pub async fn run(invocation: Invocation) -> Result<Outcome> {
    // Initialize error handling
    color_eyre::install().map_err(|e| Error::startup(e.to_string()))?;

    // Initialize logging (to file, stdout carries query answers)
    logging::init()?;

    let settings = load_config(invocation.config_dir.as_deref())?;
    let result = run_with_settings(&settings, &invocation).await;

    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }
    result
}

/// Locate, initialize and load the settings file.
///
/// A missing config directory is created with a commented default file;
/// failing to do so is not fatal. Values that cannot work are.
pub fn load_config(config_dir: Option<&Path>) -> Result<Settings> {
    let dir = config_dir.map(Path::to_path_buf).or_else(default_config_dir);

    let settings = match dir {
        Some(dir) => {
            if let Err(e) = init_config_dir(&dir) {
                warn!("Could not initialize {}: {}", dir.display(), e);
            }
            load_settings(&dir)
        }
        None => {
            debug!("No config directory available, using defaults");
            Settings::default()
        }
    };

    settings.validate()?;
    Ok(settings)
}

/// Arbitrate for the endpoint and run whichever role we get.
pub async fn run_with_settings(settings: &Settings, invocation: &Invocation) -> Result<Outcome> {
    let endpoint = settings.endpoint();
    debug!("Rendezvous path: {}", endpoint.path().display());

    let connection = Connection::open(&endpoint, settings.transport_options())
        .await
        .with_context(|| format!("Arbitration for {} failed", endpoint.path().display()))?;
    logging::log_startup(connection.role(), std::process::id());

    match connection {
        Connection::Owner(owner) => {
            let stats = crate::headless::run_owner(
                owner,
                settings,
                &invocation.options,
                &invocation.cwd,
            )
            .await?;
            info!("solo exiting");
            Ok(Outcome::Owned(stats))
        }
        Connection::Caller(caller) => {
            let forwarded =
                caller::run_caller(caller, settings, &invocation.options, &invocation.cwd).await?;
            Ok(Outcome::Forwarded(forwarded))
        }
    }
}
