//! Application settings
//!
//! Optional TOML file controlling where sessions are stored and how files are
//! read while hashing. Command-line flags take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::inventory::hash::DEFAULT_CHUNK_SIZE;

const APP_DIR_NAME: &str = "hashtally";
const SETTINGS_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root under which `Sessions/<datetime>/` directories are created
    pub sessions_dir: Option<PathBuf>,
    /// Bytes read per chunk while hashing
    pub chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sessions_dir: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Settings {
    /// Default settings file location (`<config dir>/hashtally/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if explicit {
                bail!("Settings file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        if settings.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        Ok(settings)
    }

    /// Resolve the sessions root: explicit override, then the file, then the
    /// platform data directory, then the working directory
    pub fn sessions_root(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.sessions_dir.clone())
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
