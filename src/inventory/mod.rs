// Inventory core library
// Resumable discover-then-hash pipeline and the pieces it is built from

pub mod algorithm;
pub mod discover;
pub mod error;
pub mod hash;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod store;

// Re-export commonly used types for convenience
pub use algorithm::HashAlgorithm;
pub use discover::Discoverer;
pub use error::InventoryError;
pub use hash::{HashComputer, Hasher};
pub use pipeline::{Pipeline, PipelineEvent, PipelineState, RunRequest, RunSummary};
pub use record::{FileRecord, TABLE_HEADER};
pub use session::{Session, SessionOrigin, SessionPaths};
pub use store::{TableReader, TableWriter};
