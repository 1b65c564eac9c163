// File discovery module
// Lazily walks a target path and yields one record per regular file

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::record::FileRecord;

/// Lazy walk over a single file or a directory tree.
///
/// Directories are read one at a time; files of a directory are yielded before
/// any of its subdirectories are opened. In non-recursive mode only the
/// immediate children of the target are considered. Each walk reads the
/// filesystem afresh.
pub struct Discoverer {
    recursive: bool,
    exclude: Option<PathBuf>,
    single_file: Option<PathBuf>,
    current: Option<ReadDir>,
    current_subdirs: Vec<PathBuf>,
    pending_dirs: Vec<PathBuf>,
    skipped: usize,
}

impl Discoverer {
    pub fn new(target: &Path, recursive: bool) -> Self {
        let mut discoverer = Self {
            recursive,
            exclude: None,
            single_file: None,
            current: None,
            current_subdirs: Vec::new(),
            pending_dirs: Vec::new(),
            skipped: 0,
        };

        match fs::metadata(target) {
            Ok(meta) if meta.is_file() => discoverer.single_file = Some(target.to_path_buf()),
            Ok(meta) if meta.is_dir() => discoverer.pending_dirs.push(target.to_path_buf()),
            Ok(_) => warn!("Target is neither a file nor a directory: {}", target.display()),
            Err(e) => warn!("Cannot read target {}: {}", target.display(), e),
        }

        discoverer
    }

    /// Never descend into `path` (used to keep session output out of the walk)
    pub fn with_exclude(mut self, path: &Path) -> Self {
        self.exclude = Some(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()));
        self
    }

    /// Entries that vanished or could not be read during the walk so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn is_excluded(&self, path: &Path) -> bool {
        match &self.exclude {
            Some(exclude) => {
                let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
                canonical.starts_with(exclude)
            }
            None => false,
        }
    }

    /// Stat a file and build its record; a file that disappeared is skipped
    fn record_for(&mut self, path: &Path) -> Option<FileRecord> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                let record = FileRecord::from_metadata(path, &meta);
                if record.is_none() {
                    warn!("Skipping {}: path is not valid UTF-8", path.display());
                    self.skipped += 1;
                }
                record
            }
            Ok(_) => None,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                self.skipped += 1;
                None
            }
        }
    }

    fn open_next_dir(&mut self) -> bool {
        while let Some(dir) = self.pending_dirs.pop() {
            match fs::read_dir(&dir) {
                Ok(entries) => {
                    self.current = Some(entries);
                    return true;
                }
                Err(e) => {
                    warn!("Cannot read directory {}: {}", dir.display(), e);
                    self.skipped += 1;
                }
            }
        }
        false
    }
}

impl Iterator for Discoverer {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        if let Some(path) = self.single_file.take() {
            if let Some(record) = self.record_for(&path) {
                return Some(record);
            }
        }

        loop {
            let Some(entries) = self.current.as_mut() else {
                if !self.open_next_dir() {
                    return None;
                }
                continue;
            };

            let entry = match entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    warn!("Cannot read directory entry: {}", e);
                    self.skipped += 1;
                    continue;
                }
                None => {
                    self.current = None;
                    // Subdirectories are entered in listing order once their parent is done
                    let subdirs = std::mem::take(&mut self.current_subdirs);
                    self.pending_dirs.extend(subdirs.into_iter().rev());
                    continue;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    self.skipped += 1;
                    continue;
                }
            };

            // Symlinked directories are never entered, so the walk cannot cycle
            if file_type.is_dir() {
                if self.recursive && !self.is_excluded(&path) {
                    self.current_subdirs.push(path);
                }
                continue;
            }

            if let Some(record) = self.record_for(&path) {
                return Some(record);
            }
        }
    }
}
