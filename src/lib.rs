//! Scrub through GPS tracks and fill location forms from a device position fix
use std::path::PathBuf;

pub mod cli;
pub mod config;
mod error;
pub mod geolocation;
pub mod gps;
pub mod services;
pub mod track;

pub use error::Error;
pub use gps::{encode_coordinates, Location};

static CONFIG_DIR_NAME: &str = "track-scrubber";
static CONFIG_FILE_NAME: &str = "config.yml";

/// Default location of the configuration file
pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}
