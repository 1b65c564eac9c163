// Tests for the streaming hash computer

use std::fs;
use std::io::Cursor;

use hashtally::inventory::{HashAlgorithm, HashComputer, InventoryError};

use super::common::write_file;

const EMPTY_DIGESTS: [(HashAlgorithm, &str); 6] = [
    (HashAlgorithm::Md5, "d41d8cd98f00b204e9800998ecf8427e"),
    (HashAlgorithm::Sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709"),
    (HashAlgorithm::Sha224, "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f"),
    (HashAlgorithm::Sha256, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"),
    (
        HashAlgorithm::Sha384,
        "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da274edebfe76f65fbd51ad2f14898b95b",
    ),
    (
        HashAlgorithm::Sha512,
        "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e",
    ),
];

const ABC_DIGESTS: [(HashAlgorithm, &str); 6] = [
    (HashAlgorithm::Md5, "900150983cd24fb0d6963f7d28e17f72"),
    (HashAlgorithm::Sha1, "a9993e364706816aba3e25717850c26c9cd0d89d"),
    (HashAlgorithm::Sha224, "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7"),
    (HashAlgorithm::Sha256, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
    (
        HashAlgorithm::Sha384,
        "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7",
    ),
    (
        HashAlgorithm::Sha512,
        "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f",
    ),
];

#[test]
fn test_empty_file_digests() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "empty.txt", b"");
    let computer = HashComputer::new();

    for (algorithm, expected) in EMPTY_DIGESTS {
        assert_eq!(computer.compute_hash(&path, algorithm).unwrap(), expected, "{}", algorithm);
    }
}

#[test]
fn test_abc_digests() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "abc.txt", b"abc");
    let computer = HashComputer::new();

    for (algorithm, expected) in ABC_DIGESTS {
        assert_eq!(computer.compute_hash(&path, algorithm).unwrap(), expected, "{}", algorithm);
    }
}

#[test]
fn test_streaming_large_file() {
    // Larger than the default chunk, read in many small chunks
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "large.bin", &vec![b'a'; 100_000]);

    let small_chunks = HashComputer::with_chunk_size(1000);
    let result = small_chunks.compute_hash(&path, HashAlgorithm::Sha256).unwrap();

    assert_eq!(result, "6d1cf22d7cc09b085dfc25ee1a1f3ae0265804c607bc2074ad253bcc82fd81ee");
    assert_eq!(result, HashComputer::new().compute_hash(&path, HashAlgorithm::Sha256).unwrap());
}

#[test]
fn test_zero_chunk_size_is_clamped() {
    let computer = HashComputer::with_chunk_size(0);
    assert_eq!(computer.chunk_size(), 1);
    let digest = computer
        .compute_hash_reader(Cursor::new(b"abc".to_vec()), HashAlgorithm::Md5)
        .unwrap();
    assert_eq!(digest, "900150983cd24fb0d6963f7d28e17f72");
}

#[test]
fn test_file_not_found_error() {
    let dir = tempfile::tempdir().unwrap();
    let computer = HashComputer::new();
    let result = computer.compute_hash(&dir.path().join("nonexistent.txt"), HashAlgorithm::Sha256);

    match result {
        Err(InventoryError::FileNotFound { .. }) => {}
        other => panic!("Expected FileNotFound, got {:?}", other),
    }
}

#[test]
fn test_directory_cannot_be_hashed() {
    let dir = tempfile::tempdir().unwrap();
    let computer = HashComputer::new();
    assert!(computer.compute_hash(dir.path(), HashAlgorithm::Md5).is_err());
}

#[test]
fn test_placeholder_substituted_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "gone.txt", b"data");
    fs::remove_file(&path).unwrap();

    let (value, error) = HashComputer::new().compute_or_placeholder(&path, HashAlgorithm::Sha256);
    assert_eq!(value, "-".repeat(64));
    assert!(error.is_some());
}

#[test]
fn test_no_placeholder_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "abc.txt", b"abc");

    let (value, error) = HashComputer::new().compute_or_placeholder(&path, HashAlgorithm::Md5);
    assert_eq!(value, "900150983cd24fb0d6963f7d28e17f72");
    assert!(error.is_none());
}
