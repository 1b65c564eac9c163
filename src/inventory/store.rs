// Inventory table storage
// Append-only CSV tables with a header row, written one flushed row at a time

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::algorithm::HashAlgorithm;
use super::error::InventoryError;
use super::record::{FileRecord, TABLE_HEADER};

/// Appends records to one table.
///
/// Each row is flushed as soon as it is written so an interrupted run always
/// leaves a readable prefix behind.
pub struct TableWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl TableWriter {
    /// Create (or truncate) a table and write its header row
    pub fn create(path: &Path) -> Result<Self, InventoryError> {
        ensure_parent(path)?;
        let file = File::create(path).map_err(|e| {
            InventoryError::from_io_error(e, "creating table", Some(path.to_path_buf()))
        })?;
        let mut table = Self::from_file(path, file);
        table.write_row(&TABLE_HEADER)?;
        Ok(table)
    }

    /// Open an existing table for appending; writes the header if the file is new or empty
    pub fn open_append(path: &Path) -> Result<Self, InventoryError> {
        ensure_parent(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                InventoryError::from_io_error(e, "opening table", Some(path.to_path_buf()))
            })?;
        let is_empty = file
            .metadata()
            .map_err(|e| InventoryError::from_io_error(e, "reading metadata", Some(path.to_path_buf())))?
            .len()
            == 0;

        let mut table = Self::from_file(path, file);
        if is_empty {
            table.write_row(&TABLE_HEADER)?;
        }
        Ok(table)
    }

    fn from_file(path: &Path, file: File) -> Self {
        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        Self {
            path: path.to_path_buf(),
            writer,
            rows_written: 0,
        }
    }

    fn write_row(&mut self, row: &[&str]) -> Result<(), InventoryError> {
        self.writer
            .write_record(row)
            .map_err(|e| InventoryError::from_csv_error(e, self.path.clone()))?;
        self.flush()
    }

    /// Append one record and flush it to disk
    pub fn append(&mut self, record: &FileRecord) -> Result<(), InventoryError> {
        self.writer
            .serialize(record)
            .map_err(|e| InventoryError::from_csv_error(e, self.path.clone()))?;
        self.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), InventoryError> {
        self.writer.flush().map_err(|e| {
            InventoryError::from_io_error(e, "flushing table", Some(self.path.clone()))
        })
    }

    /// Data rows appended through this writer
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sequential reader over a table's data rows
pub struct TableReader {
    path: PathBuf,
    reader: csv::Reader<File>,
}

impl TableReader {
    pub fn open(path: &Path) -> Result<Self, InventoryError> {
        let file = File::open(path).map_err(|e| {
            InventoryError::from_io_error(e, "opening table", Some(path.to_path_buf()))
        })?;
        let reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        Ok(Self {
            path: path.to_path_buf(),
            reader,
        })
    }

    /// Iterate over the data rows in file order
    pub fn records(&mut self) -> impl Iterator<Item = Result<FileRecord, InventoryError>> + '_ {
        let path = self.path.clone();
        self.reader
            .deserialize::<FileRecord>()
            .map(move |row| row.map_err(|e| InventoryError::from_csv_error(e, path.clone())))
    }
}

/// Read every data row of a table
pub fn read_table(path: &Path) -> Result<Vec<FileRecord>, InventoryError> {
    let mut reader = TableReader::open(path)?;
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Result of scanning a hashed table left behind by an earlier attempt
#[derive(Debug, Default)]
pub struct CompletedRows {
    /// (Location, Name) keys that already carry a digest or placeholder
    pub keys: HashSet<(String, String)>,
    /// Bytes dropped from the end of the table because the last row was torn
    pub truncated_bytes: u64,
}

/// Collect completed keys from an existing hashed table and cut off a torn final row.
///
/// The valid prefix ends at the first row that fails to parse or whose hash is
/// not a complete digest for `algorithm`. Anything after it is truncated so
/// later appends start on a clean row boundary. A missing table, or one whose
/// header was never completed, yields no keys.
pub fn recover_hashed_table(
    path: &Path,
    algorithm: HashAlgorithm,
) -> Result<CompletedRows, InventoryError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CompletedRows::default()),
        Err(e) => {
            return Err(InventoryError::from_io_error(e, "opening table", Some(path.to_path_buf())))
        }
    };
    let file_len = file
        .metadata()
        .map_err(|e| InventoryError::from_io_error(e, "reading metadata", Some(path.to_path_buf())))?
        .len();

    // A crash before the header was flushed leaves a prefix of it; start over
    let header_line = format!("{}\n", TABLE_HEADER.join(","));
    if file_len < header_line.len() as u64 {
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| InventoryError::from_io_error(e, "reading table", Some(path.to_path_buf())))?;
        if header_line.as_bytes().starts_with(&contents) {
            if file_len > 0 {
                warn!("Discarding incomplete header of {}", path.display());
                truncate(path, 0)?;
            }
            return Ok(CompletedRows {
                truncated_bytes: file_len,
                ..CompletedRows::default()
            });
        }
        file.rewind()
            .map_err(|e| InventoryError::from_io_error(e, "reading table", Some(path.to_path_buf())))?;
    }

    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(file);
    let mut completed = CompletedRows::default();
    let mut valid_end = 0u64;
    let mut record = csv::StringRecord::new();
    let mut seen_header = false;

    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(e) => {
                debug!("Stopping at unreadable row in {}: {}", path.display(), e);
                break;
            }
        }

        if !seen_header {
            if record.iter().ne(TABLE_HEADER.iter().copied()) {
                return Err(InventoryError::Config {
                    path: path.to_path_buf(),
                    reason: "hashed table does not start with the expected header".to_string(),
                });
            }
            seen_header = true;
        } else {
            let row: FileRecord = match record.deserialize(None) {
                Ok(row) => row,
                Err(e) => {
                    debug!("Stopping at malformed row in {}: {}", path.display(), e);
                    break;
                }
            };
            match row.hash.as_deref() {
                Some(hash) if algorithm.is_complete_digest(hash) => {
                    completed.keys.insert(row.key());
                }
                _ => break,
            }
        }

        valid_end = reader.position().byte();
    }

    if valid_end < file_len {
        warn!(
            "Discarding {} trailing byte(s) of incomplete row in {}",
            file_len - valid_end,
            path.display()
        );
        truncate(path, valid_end)?;
        completed.truncated_bytes = file_len - valid_end;
    } else if valid_end > 0 {
        terminate_last_row(path)?;
    }

    Ok(completed)
}

/// A final row cut just before its terminator still parses; finish it so the next append starts a new row
fn terminate_last_row(path: &Path) -> Result<(), InventoryError> {
    let mut file = OpenOptions::new().read(true).append(true).open(path).map_err(|e| {
        InventoryError::from_io_error(e, "opening table", Some(path.to_path_buf()))
    })?;
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| InventoryError::from_io_error(e, "reading table", Some(path.to_path_buf())))?;
    if last[0] != b'\n' {
        file.write_all(b"\n").map_err(|e| {
            InventoryError::from_io_error(e, "repairing table", Some(path.to_path_buf()))
        })?;
    }
    Ok(())
}

fn truncate(path: &Path, len: u64) -> Result<(), InventoryError> {
    let file = OpenOptions::new().write(true).open(path).map_err(|e| {
        InventoryError::from_io_error(e, "opening table", Some(path.to_path_buf()))
    })?;
    file.set_len(len).map_err(|e| {
        InventoryError::from_io_error(e, "truncating table", Some(path.to_path_buf()))
    })
}

fn ensure_parent(path: &Path) -> Result<(), InventoryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            InventoryError::from_io_error(e, "creating directory", Some(parent.to_path_buf()))
        })?;
    }
    Ok(())
}
