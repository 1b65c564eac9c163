// File record module
// One row of the discovered or hashed table

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Header row shared by the discovered and hashed tables
pub const TABLE_HEADER: [&str; 6] = ["Location", "Name", "Size", "Created", "Modified", "Hash"];

/// Metadata snapshot of one file, optionally completed with its digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Size")]
    pub size: u64,
    /// Seconds since the UNIX epoch
    #[serde(rename = "Created")]
    pub created: f64,
    /// Seconds since the UNIX epoch
    #[serde(rename = "Modified")]
    pub modified: f64,
    /// Empty until hashing is attempted
    #[serde(rename = "Hash")]
    pub hash: Option<String>,
}

impl FileRecord {
    /// Build a record from a path and metadata read at discovery time.
    ///
    /// Returns `None` when the directory or file name is not valid UTF-8, since
    /// such a row could not be turned back into the path it came from.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Option<Self> {
        let location = path.parent().map_or(Some(""), Path::to_str)?.to_string();
        let name = path.file_name()?.to_str()?.to_string();

        Some(Self {
            location,
            name,
            size: metadata.len(),
            created: created_seconds(metadata),
            modified: metadata.modified().map(epoch_seconds).unwrap_or(0.0),
            hash: None,
        })
    }

    /// Full path of the file this record describes
    pub fn path(&self) -> PathBuf {
        Path::new(&self.location).join(&self.name)
    }

    /// Natural key of the record
    pub fn key(&self) -> (String, String) {
        (self.location.clone(), self.name.clone())
    }

    /// True when a digest or placeholder has been recorded
    pub fn has_hash(&self) -> bool {
        self.hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    /// Copy of this record completed with `hash`
    pub fn with_hash(&self, hash: String) -> Self {
        Self {
            hash: Some(hash),
            ..self.clone()
        }
    }
}

fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Creation time where the platform records it, otherwise the inode change time
fn created_seconds(metadata: &Metadata) -> f64 {
    if let Ok(created) = metadata.created() {
        return epoch_seconds(created);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        metadata.ctime() as f64 + metadata.ctime_nsec() as f64 / 1_000_000_000.0
    }

    #[cfg(not(unix))]
    {
        metadata.modified().map(epoch_seconds).unwrap_or(0.0)
    }
}
