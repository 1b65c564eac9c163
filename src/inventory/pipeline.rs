// Resumable pipeline module
// Sequences discovery, session persistence and hashing for one run

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::algorithm::HashAlgorithm;
use super::discover::Discoverer;
use super::error::InventoryError;
use super::hash::HashComputer;
use super::record::FileRecord;
use super::session::{Session, SessionPaths};
use super::store::{self, TableReader, TableWriter};

/// What the caller asked for, resolved once at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunRequest {
    Fresh {
        target: PathBuf,
        recursive: bool,
        algorithm: HashAlgorithm,
        verbose: bool,
    },
    Resume {
        session_path: PathBuf,
    },
}

/// Pipeline progress; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Init,
    Discovering,
    Persisted,
    Hashing,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "init",
            PipelineState::Discovering => "discovering",
            PipelineState::Persisted => "persisted",
            PipelineState::Hashing => "hashing",
            PipelineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Counters for one run, owned by the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Rows in the discovered table
    pub discovered: usize,
    /// Rows appended to the hashed table by this run
    pub hashed: usize,
    /// Appended rows that carry the placeholder
    pub failed: usize,
    /// Rows skipped because an earlier attempt already recorded them
    pub already_hashed: usize,
    /// Entries that vanished or could not be read during discovery
    pub skipped_entries: usize,
    /// Bytes of the files hashed by this run
    pub total_bytes: u64,
    pub duration: Duration,
}

/// Progress notification delivered to the reporting callback
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    Discovered { count: usize, record: &'a FileRecord },
    DiscoveryFinished { count: usize },
    /// Emitted before a file is read
    Hashing { index: usize, total: usize, record: &'a FileRecord },
    Hashed { record: &'a FileRecord, failed: bool },
    AlreadyHashed { record: &'a FileRecord },
    Finished { summary: &'a RunSummary },
}

/// Type alias for progress callback function
pub type ProgressCallback = Box<dyn Fn(&PipelineEvent<'_>)>;

/// Orchestrates Init -> Discovering -> Persisted -> Hashing -> Done
pub struct Pipeline {
    session: Session,
    paths: SessionPaths,
    computer: HashComputer,
    state: PipelineState,
    summary: RunSummary,
    progress_callback: Option<ProgressCallback>,
}

impl Pipeline {
    /// Validate the request and resolve where the session lives.
    ///
    /// A fresh request is validated and stamped; a resume request loads its
    /// descriptor. Either failure aborts before any discovery happens.
    pub fn prepare(request: RunRequest, sessions_root: &Path) -> Result<Self, InventoryError> {
        let session = match request {
            RunRequest::Fresh {
                target,
                recursive,
                algorithm,
                verbose,
            } => Session::create(&target, recursive, algorithm, verbose)?,
            RunRequest::Resume { session_path } => Session::load(&session_path)?,
        };
        Ok(Self::from_session(session, sessions_root))
    }

    /// Pipeline for an already-built session
    pub fn from_session(session: Session, sessions_root: &Path) -> Self {
        let paths = SessionPaths::for_session(&session, sessions_root);
        Self {
            session,
            paths,
            computer: HashComputer::new(),
            state: PipelineState::Init,
            summary: RunSummary::default(),
            progress_callback: None,
        }
    }

    /// Use a specific hash computer (e.g. a configured chunk size)
    pub fn with_computer(mut self, computer: HashComputer) -> Self {
        self.computer = computer;
        self
    }

    /// Set a progress callback function
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PipelineEvent<'_>) + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Drive the pipeline to `Done`
    pub fn run(&mut self) -> Result<RunSummary, InventoryError> {
        let start = Instant::now();
        while self.state != PipelineState::Done {
            self.advance()?;
        }
        self.summary.duration = start.elapsed();
        self.emit(&PipelineEvent::Finished {
            summary: &self.summary,
        });
        Ok(self.summary.clone())
    }

    /// Perform the work of the current state and move to the next one
    pub fn advance(&mut self) -> Result<PipelineState, InventoryError> {
        let next = match self.state {
            PipelineState::Init => {
                if !self.session.is_loaded() && self.paths.descriptor.exists() {
                    return Err(InventoryError::SessionExists {
                        path: self.paths.descriptor.clone(),
                    });
                }
                PipelineState::Discovering
            }
            PipelineState::Discovering => {
                self.discover()?;
                self.session.persist(&self.paths.descriptor)?;
                PipelineState::Persisted
            }
            PipelineState::Persisted => {
                self.hash_discovered()?;
                PipelineState::Hashing
            }
            PipelineState::Hashing | PipelineState::Done => PipelineState::Done,
        };
        info!("Pipeline {} -> {}", self.state, next);
        self.state = next;
        Ok(next)
    }

    fn emit(&self, event: &PipelineEvent<'_>) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }

    /// Walk the target, appending every record to the discovered table as it is found.
    ///
    /// A resumed session whose discovered table exists keeps it: the descriptor
    /// is only saved after discovery completes, so that table is whole.
    fn discover(&mut self) -> Result<(), InventoryError> {
        if self.session.is_loaded() && self.paths.discovered.is_file() {
            let count = count_rows(&self.paths.discovered)?;
            info!(
                "Reusing discovered table {} ({} files)",
                self.paths.discovered.display(),
                count
            );
            self.summary.discovered = count;
            self.emit(&PipelineEvent::DiscoveryFinished { count });
            return Ok(());
        }

        let mut table = TableWriter::create(&self.paths.discovered)?;
        let mut discoverer = Discoverer::new(&self.session.target_path, self.session.recursive)
            .with_exclude(self.paths.excluded_dir());

        for record in discoverer.by_ref() {
            table.append(&record)?;
            debug!("Discovered {}", record.path().display());
            self.emit(&PipelineEvent::Discovered {
                count: table.rows_written(),
                record: &record,
            });
        }

        self.summary.discovered = table.rows_written();
        self.summary.skipped_entries = discoverer.skipped();
        info!(
            "Discovered {} files under {}",
            self.summary.discovered,
            self.session.target_path.display()
        );
        self.emit(&PipelineEvent::DiscoveryFinished {
            count: self.summary.discovered,
        });
        Ok(())
    }

    /// Hash every discovered row that has no recorded digest yet
    fn hash_discovered(&mut self) -> Result<(), InventoryError> {
        let algorithm = self.session.algorithm;

        let (mut table, completed) = if self.session.is_loaded() {
            let completed = store::recover_hashed_table(&self.paths.hashed, algorithm)?;
            info!(
                "Resuming with {} file(s) already hashed",
                completed.keys.len()
            );
            (TableWriter::open_append(&self.paths.hashed)?, completed.keys)
        } else {
            (TableWriter::create(&self.paths.hashed)?, Default::default())
        };

        let total = self.summary.discovered;
        let mut reader = TableReader::open(&self.paths.discovered)?;

        for (index, row) in reader.records().enumerate() {
            let record = row?;

            if record.has_hash() || completed.contains(&record.key()) {
                self.summary.already_hashed += 1;
                self.emit(&PipelineEvent::AlreadyHashed { record: &record });
                continue;
            }

            self.emit(&PipelineEvent::Hashing {
                index: index + 1,
                total,
                record: &record,
            });

            let (hash, error) = self.computer.compute_or_placeholder(&record.path(), algorithm);
            let failed = error.is_some();
            if let Some(e) = error {
                info!("Failed to hash {}: {}", record.path().display(), e);
                self.summary.failed += 1;
            } else {
                self.summary.total_bytes += record.size;
            }

            let completed_record = record.with_hash(hash);
            table.append(&completed_record)?;
            self.summary.hashed += 1;
            self.emit(&PipelineEvent::Hashed {
                record: &completed_record,
                failed,
            });
        }

        info!(
            "Hashed {} file(s), {} failed, {} already done",
            self.summary.hashed, self.summary.failed, self.summary.already_hashed
        );
        Ok(())
    }
}

fn count_rows(path: &Path) -> Result<usize, InventoryError> {
    let mut reader = TableReader::open(path)?;
    let mut count = 0;
    for row in reader.records() {
        row?;
        count += 1;
    }
    Ok(count)
}
