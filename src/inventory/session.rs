// Session state module
// Durable snapshot of a run's inputs and the on-disk layout derived from it

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::algorithm::HashAlgorithm;
use super::error::InventoryError;

/// Format of the session timestamp, which also names the session directory
pub const SESSION_DATETIME_FORMAT: &str = "%Y-%m-%d@%H-%M-%S";

pub const SESSIONS_DIR_NAME: &str = "Sessions";
pub const SESSION_CONFIG_DIR: &str = "config";
pub const SESSION_FILE_NAME: &str = "hashtally.config";
pub const DISCOVERED_TABLE_NAME: &str = "discovered_files.csv";
pub const HASHED_TABLE_NAME: &str = "hashed_files.csv";

/// How a session came to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Created from command-line inputs in this process
    Fresh,
    /// Read back from a persisted descriptor
    Loaded { descriptor: PathBuf },
}

/// Configuration snapshot identifying one inventory-and-hash run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub target_path: PathBuf,
    pub recursive: bool,
    pub algorithm: HashAlgorithm,
    pub verbose: bool,
    /// Creation timestamp, formatted with `SESSION_DATETIME_FORMAT`
    pub datetime: String,
    pub origin: SessionOrigin,
}

/// On-disk descriptor: a single `[settings]` table
#[derive(Debug, Serialize, Deserialize)]
struct Descriptor {
    settings: DescriptorSettings,
}

#[derive(Debug, Serialize, Deserialize)]
struct DescriptorSettings {
    session_target_path: String,
    session_recursive_search: Flag,
    session_hash_type: String,
    session_verbose_mode: Flag,
    session_datetime: String,
}

/// Boolean that also accepts `"True"`/`"false"` style strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn resolve(&self, key: &str, path: &Path) -> Result<bool, InventoryError> {
        match self {
            Flag::Bool(value) => Ok(*value),
            Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                other => Err(InventoryError::Config {
                    path: path.to_path_buf(),
                    reason: format!("{} must be a boolean, found '{}'", key, other),
                }),
            },
        }
    }
}

impl Session {
    /// Build a fresh session stamped with the current local time
    pub fn create(
        target_path: &Path,
        recursive: bool,
        algorithm: HashAlgorithm,
        verbose: bool,
    ) -> Result<Self, InventoryError> {
        let datetime = Local::now().format(SESSION_DATETIME_FORMAT).to_string();
        Self::create_at(target_path, recursive, algorithm, verbose, datetime)
    }

    /// Build a fresh session with an explicit timestamp
    pub fn create_at(
        target_path: &Path,
        recursive: bool,
        algorithm: HashAlgorithm,
        verbose: bool,
        datetime: String,
    ) -> Result<Self, InventoryError> {
        validate_datetime(&datetime).map_err(|reason| InventoryError::InvalidDatetime {
            datetime: datetime.clone(),
            reason,
        })?;

        Ok(Self {
            target_path: validate_target(target_path)?,
            recursive,
            algorithm,
            verbose,
            datetime,
            origin: SessionOrigin::Fresh,
        })
    }

    /// Parse a persisted descriptor, applying the same validation as fresh inputs
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => InventoryError::Config {
                path: path.to_path_buf(),
                reason: "descriptor does not exist".to_string(),
            },
            _ => InventoryError::from_io_error(e, "reading session descriptor", Some(path.to_path_buf())),
        })?;

        let descriptor: Descriptor = toml::from_str(&text).map_err(|e| InventoryError::Config {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        let settings = descriptor.settings;

        validate_datetime(&settings.session_datetime).map_err(|reason| InventoryError::Config {
            path: path.to_path_buf(),
            reason,
        })?;

        let session = Self {
            target_path: validate_target(Path::new(&settings.session_target_path))?,
            recursive: settings
                .session_recursive_search
                .resolve("session_recursive_search", path)?,
            algorithm: settings.session_hash_type.parse()?,
            verbose: settings
                .session_verbose_mode
                .resolve("session_verbose_mode", path)?,
            datetime: settings.session_datetime,
            origin: SessionOrigin::Loaded {
                descriptor: path.to_path_buf(),
            },
        };

        info!("Loaded session {} from {}", session.datetime, path.display());
        Ok(session)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.origin, SessionOrigin::Loaded { .. })
    }

    /// Write the descriptor once. Loaded sessions are never rewritten.
    ///
    /// Returns `true` if a descriptor was written.
    pub fn persist(&self, path: &Path) -> Result<bool, InventoryError> {
        if self.is_loaded() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                InventoryError::from_io_error(e, "creating session directory", Some(parent.to_path_buf()))
            })?;
        }

        let descriptor = Descriptor {
            settings: DescriptorSettings {
                session_target_path: self.target_path.to_string_lossy().into_owned(),
                session_recursive_search: Flag::Bool(self.recursive),
                session_hash_type: self.algorithm.name().to_string(),
                session_verbose_mode: Flag::Bool(self.verbose),
                session_datetime: self.datetime.clone(),
            },
        };
        let text = toml::to_string(&descriptor).map_err(|e| InventoryError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => InventoryError::SessionExists {
                    path: path.to_path_buf(),
                },
                _ => InventoryError::from_io_error(e, "writing session descriptor", Some(path.to_path_buf())),
            })?;
        file.write_all(text.as_bytes()).map_err(|e| {
            InventoryError::from_io_error(e, "writing session descriptor", Some(path.to_path_buf()))
        })?;

        info!("Saved session descriptor to {}", path.display());
        Ok(true)
    }
}

/// Locations of everything a session reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    /// `<root>/Sessions/<datetime>`
    pub session_dir: PathBuf,
    pub descriptor: PathBuf,
    pub discovered: PathBuf,
    pub hashed: PathBuf,
}

impl SessionPaths {
    /// Layout for a new session under `sessions_root`
    pub fn new(sessions_root: &Path, datetime: &str) -> Self {
        let session_dir = sessions_root.join(SESSIONS_DIR_NAME).join(datetime);
        Self::in_config_dir(session_dir.join(SESSION_CONFIG_DIR), session_dir)
    }

    /// Layout of a loaded session: tables live next to its descriptor
    pub fn from_descriptor(descriptor: &Path) -> Self {
        let config_dir = descriptor
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let session_dir = config_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_dir.clone());
        Self::in_config_dir(config_dir, session_dir)
    }

    /// Paths for `session`, wherever it came from
    pub fn for_session(session: &Session, sessions_root: &Path) -> Self {
        match &session.origin {
            SessionOrigin::Fresh => Self::new(sessions_root, &session.datetime),
            SessionOrigin::Loaded { descriptor } => Self::from_descriptor(descriptor),
        }
    }

    /// Directory the walk must not enter: the `Sessions` directory holding
    /// this session and its siblings, or the session directory itself when it
    /// lives elsewhere
    pub fn excluded_dir(&self) -> &Path {
        match self.session_dir.parent() {
            Some(parent) if parent.file_name().is_some_and(|name| name == SESSIONS_DIR_NAME) => parent,
            _ => self.session_dir.as_path(),
        }
    }

    fn in_config_dir(config_dir: PathBuf, session_dir: PathBuf) -> Self {
        Self {
            descriptor: config_dir.join(SESSION_FILE_NAME),
            discovered: config_dir.join(DISCOVERED_TABLE_NAME),
            hashed: config_dir.join(HASHED_TABLE_NAME),
            session_dir,
        }
    }
}

/// True when `path` names a session descriptor rather than something to inventory
pub fn is_session_descriptor(path: &Path) -> bool {
    path.is_file() && path.file_name().is_some_and(|name| name == SESSION_FILE_NAME)
}

/// Accept an existing regular file or directory, returning its absolute form
pub fn validate_target(path: &Path) -> Result<PathBuf, InventoryError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() || meta.is_dir() => {
            path.canonicalize().map_err(|e| {
                InventoryError::from_io_error(e, "resolving target", Some(path.to_path_buf()))
            })
        }
        _ => Err(InventoryError::InvalidTarget {
            path: path.to_path_buf(),
        }),
    }
}

fn validate_datetime(datetime: &str) -> Result<(), String> {
    NaiveDateTime::parse_from_str(datetime, SESSION_DATETIME_FORMAT)
        .map(|_| ())
        .map_err(|e| format!("session_datetime '{}' is not {}: {}", datetime, SESSION_DATETIME_FORMAT, e))
}
