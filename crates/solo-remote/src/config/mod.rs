//! Configuration file handling for solo
//!
//! Supports `<config_dir>/solo/config.toml` (global settings).

pub mod settings;
pub mod types;

pub use settings::{
    default_config_dir, init_config_dir, load_settings, CONFIG_DIR_NAME,
    CONFIG_FILENAME,
};
pub use types::*;
