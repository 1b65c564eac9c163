// Hash computation module
// Streams file contents through the selected digest in fixed-size chunks

use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use super::algorithm::HashAlgorithm;
use super::error::InventoryError;

/// Default read chunk for streaming hashes (64KB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Trait for hash algorithm implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the result
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// Adapter from a RustCrypto digest to the object-safe `Hasher`
struct DigestWrapper<D>(D);

impl<D> Hasher for DigestWrapper<D>
where
    D: Digest + Send,
{
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Digest::finalize(self.0).to_vec()
    }
}

/// Get a hasher instance for the specified algorithm
pub fn get_hasher(algorithm: HashAlgorithm) -> Box<dyn Hasher> {
    match algorithm {
        HashAlgorithm::Md5 => Box::new(DigestWrapper(Md5::new())),
        HashAlgorithm::Sha1 => Box::new(DigestWrapper(Sha1::new())),
        HashAlgorithm::Sha224 => Box::new(DigestWrapper(Sha224::new())),
        HashAlgorithm::Sha256 => Box::new(DigestWrapper(Sha256::new())),
        HashAlgorithm::Sha384 => Box::new(DigestWrapper(Sha384::new())),
        HashAlgorithm::Sha512 => Box::new(DigestWrapper(Sha512::new())),
    }
}

/// Hash computer with streaming I/O
#[derive(Debug, Clone)]
pub struct HashComputer {
    chunk_size: usize,
}

impl HashComputer {
    /// Create a new HashComputer with the default chunk size
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a new HashComputer with a custom chunk size (minimum 1 byte)
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Compute the lower-case hex digest of a file.
    ///
    /// Memory use is bounded by the chunk size regardless of file size.
    pub fn compute_hash(&self, path: &Path, algorithm: HashAlgorithm) -> Result<String, InventoryError> {
        let file = File::open(path).map_err(|e| {
            InventoryError::from_io_error(e, "opening", Some(path.to_path_buf()))
        })?;
        self.compute_hash_reader(file, algorithm)
            .map_err(|e| InventoryError::from_io_error(e, "reading", Some(path.to_path_buf())))
    }

    /// Compute the hex digest of everything `reader` yields
    pub fn compute_hash_reader<R: Read>(
        &self,
        mut reader: R,
        algorithm: HashAlgorithm,
    ) -> std::io::Result<String> {
        let mut hasher = get_hasher(algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(bytes_to_hex(&hasher.finalize()))
    }

    /// Compute a digest, substituting the algorithm's placeholder on any failure.
    ///
    /// Returns the value to record and the error that caused substitution, if any.
    pub fn compute_or_placeholder(
        &self,
        path: &Path,
        algorithm: HashAlgorithm,
    ) -> (String, Option<InventoryError>) {
        match self.compute_hash(path, algorithm) {
            Ok(hash) => (hash, None),
            Err(e) => (algorithm.placeholder(), Some(e)),
        }
    }
}

impl Default for HashComputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert bytes to hexadecimal string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
