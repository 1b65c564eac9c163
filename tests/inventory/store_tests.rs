// Tests for table writing, reading and recovery

use std::fs;

use hashtally::inventory::store::{self, read_table};
use hashtally::inventory::{HashAlgorithm, InventoryError, TableWriter};

use super::common::sample_record;

const HEADER_LINE: &str = "Location,Name,Size,Created,Modified,Hash\n";

#[test]
fn test_create_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/table.csv");

    let table = TableWriter::create(&path).unwrap();
    assert_eq!(table.rows_written(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), HEADER_LINE);
}

#[test]
fn test_rows_are_flushed_as_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    let mut table = TableWriter::create(&path).unwrap();

    table.append(&sample_record("a.jpg", None)).unwrap();

    // Still open, but the row is already on disk
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        format!("{}/data/photos,a.jpg,42,1700000000.25,1700000100.5,\n", HEADER_LINE)
    );
    assert_eq!(table.rows_written(), 1);
}

#[test]
fn test_read_back_preserves_order_and_hash_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    let mut table = TableWriter::create(&path).unwrap();
    let pending = sample_record("b.jpg", None);
    let done = sample_record("a.jpg", Some("d41d8cd98f00b204e9800998ecf8427e"));
    table.append(&pending).unwrap();
    table.append(&done).unwrap();
    drop(table);

    let records = read_table(&path).unwrap();
    assert_eq!(records, vec![pending, done]);
    assert!(!records[0].has_hash());
    assert!(records[1].has_hash());
}

#[test]
fn test_names_with_commas_and_quotes_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    let mut record = sample_record("report, \"final\".txt", None);
    record.location = "/srv/a,b".to_string();

    let mut table = TableWriter::create(&path).unwrap();
    table.append(&record).unwrap();
    drop(table);

    assert_eq!(read_table(&path).unwrap(), vec![record]);
}

#[test]
fn test_open_append_writes_header_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");

    let mut first = TableWriter::open_append(&path).unwrap();
    first.append(&sample_record("a.jpg", Some("x"))).unwrap();
    drop(first);
    let mut second = TableWriter::open_append(&path).unwrap();
    second.append(&sample_record("b.jpg", Some("y"))).unwrap();
    drop(second);

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("Location,Name").count(), 1);
    assert_eq!(read_table(&path).unwrap().len(), 2);
}

#[test]
fn test_recover_missing_table_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let completed =
        store::recover_hashed_table(&dir.path().join("missing.csv"), HashAlgorithm::Md5).unwrap();
    assert!(completed.keys.is_empty());
    assert_eq!(completed.truncated_bytes, 0);
}

#[test]
fn test_recover_collects_completed_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashed.csv");
    let mut table = TableWriter::create(&path).unwrap();
    table
        .append(&sample_record("a.jpg", Some("d41d8cd98f00b204e9800998ecf8427e")))
        .unwrap();
    table
        .append(&sample_record("b.jpg", Some(HashAlgorithm::Md5.placeholder().as_str())))
        .unwrap();
    drop(table);
    let before = fs::read_to_string(&path).unwrap();

    let completed = store::recover_hashed_table(&path, HashAlgorithm::Md5).unwrap();

    assert_eq!(completed.keys.len(), 2);
    assert!(completed
        .keys
        .contains(&("/data/photos".to_string(), "b.jpg".to_string())));
    assert_eq!(completed.truncated_bytes, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_recover_truncates_torn_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashed.csv");
    let mut table = TableWriter::create(&path).unwrap();
    table
        .append(&sample_record("a.jpg", Some("d41d8cd98f00b204e9800998ecf8427e")))
        .unwrap();
    drop(table);
    let valid = fs::read_to_string(&path).unwrap();

    // Simulate a crash halfway through writing the next digest
    fs::write(&path, format!("{}/data/photos,b.jpg,42,1.0,2.0,d41d8cd9", valid)).unwrap();

    let completed = store::recover_hashed_table(&path, HashAlgorithm::Md5).unwrap();

    assert_eq!(completed.keys.len(), 1);
    assert!(completed.truncated_bytes > 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), valid);
}

#[test]
fn test_recover_truncates_row_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashed.csv");
    fs::write(&path, format!("{}/data,a.jpg,4", HEADER_LINE)).unwrap();

    let completed = store::recover_hashed_table(&path, HashAlgorithm::Md5).unwrap();

    assert!(completed.keys.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), HEADER_LINE);
}

#[test]
fn test_recover_terminates_unterminated_last_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashed.csv");
    let row = "/data,a.jpg,4,1.0,2.0,d41d8cd98f00b204e9800998ecf8427e";
    fs::write(&path, format!("{}{}", HEADER_LINE, row)).unwrap();

    let completed = store::recover_hashed_table(&path, HashAlgorithm::Md5).unwrap();
    assert_eq!(completed.keys.len(), 1);

    let mut table = TableWriter::open_append(&path).unwrap();
    table
        .append(&sample_record("b.jpg", Some("900150983cd24fb0d6963f7d28e17f72")))
        .unwrap();
    drop(table);

    let records = read_table(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "a.jpg");
    assert_eq!(records[1].name, "b.jpg");
}

#[test]
fn test_recover_rejects_foreign_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashed.csv");
    fs::write(&path, "id,value\n1,2\n").unwrap();

    match store::recover_hashed_table(&path, HashAlgorithm::Md5) {
        Err(InventoryError::Config { .. }) => {}
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_recover_discards_torn_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashed.csv");
    fs::write(&path, "Location,Na").unwrap();

    let completed = store::recover_hashed_table(&path, HashAlgorithm::Md5).unwrap();
    assert!(completed.keys.is_empty());
    assert_eq!(completed.truncated_bytes, 11);
    assert_eq!(fs::read_to_string(&path).unwrap(), "");

    let mut table = TableWriter::open_append(&path).unwrap();
    table
        .append(&sample_record("a.jpg", Some("d41d8cd98f00b204e9800998ecf8427e")))
        .unwrap();
    drop(table);

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with(HEADER_LINE));
    assert_eq!(read_table(&path).unwrap().len(), 1);
}

#[test]
fn test_recover_empty_table_is_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashed.csv");
    fs::write(&path, "").unwrap();

    let completed = store::recover_hashed_table(&path, HashAlgorithm::Md5).unwrap();
    assert!(completed.keys.is_empty());
    assert_eq!(completed.truncated_bytes, 0);
}
