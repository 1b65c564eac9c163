//! Command-line surface.
//!
//! Turns arguments into a `RunRequest`. A target whose file name is the
//! session descriptor name resumes that session; anything else starts a
//! fresh one.

use std::path::PathBuf;

use clap::Parser;

use crate::inventory::session::{is_session_descriptor, validate_target};
use crate::inventory::{HashAlgorithm, RunRequest};

#[derive(Debug, Parser)]
#[command(
    name = "hashtally",
    version,
    about = "Inventory files under a path and record a digest for each, resumably",
    after_help = "Examples:\n  \
        hashtally file_path                 Hash only the given file\n  \
        hashtally directory_path            Hash files directly inside the directory\n  \
        hashtally directory_path -r         Hash files in the directory recursively\n  \
        hashtally .../hashtally.config      Continue a previous session"
)]
pub struct Cli {
    /// File, directory, or session descriptor (hashtally.config) to resume
    #[arg(value_name = "SYSTEM_PATH", value_parser = parse_target)]
    pub target: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Show progress while discovering and hashing
    #[arg(short, long)]
    pub verbose: bool,

    /// Hash type: MD5, SHA1, SHA224, SHA256, SHA384 or SHA512
    #[arg(
        short = 'H',
        long = "hash",
        visible_alias = "hash-type",
        value_name = "HASH_TYPE",
        value_parser = parse_hash_type
    )]
    pub hash_type: Option<HashAlgorithm>,

    /// Directory under which sessions are stored
    #[arg(long, value_name = "DIR")]
    pub sessions_dir: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn is_resume(&self) -> bool {
        is_session_descriptor(&self.target)
    }

    /// Resolve the arguments into a request; flags other than the target are
    /// ignored when resuming because the session already records them
    pub fn to_request(&self) -> RunRequest {
        if self.is_resume() {
            RunRequest::Resume {
                session_path: self.target.clone(),
            }
        } else {
            RunRequest::Fresh {
                target: self.target.clone(),
                recursive: self.recursive,
                algorithm: self.hash_type.unwrap_or_default(),
                verbose: self.verbose,
            }
        }
    }
}

fn parse_target(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    validate_target(&path)
        .map(|_| path)
        .map_err(|_| "Provided target is not a valid file or directory".to_string())
}

fn parse_hash_type(value: &str) -> Result<HashAlgorithm, String> {
    value
        .parse()
        .map_err(|_| "Provided hash is not a valid or supported hash type".to_string())
}
