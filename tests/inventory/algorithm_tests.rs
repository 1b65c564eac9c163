// Tests for algorithm names, widths and placeholders

use hashtally::inventory::{HashAlgorithm, InventoryError};

#[test]
fn test_parse_is_case_insensitive() {
    assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
    assert_eq!("Sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
    assert_eq!("SHA512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
}

#[test]
fn test_parse_accepts_dashed_names() {
    assert_eq!("sha-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
    assert_eq!("SHA-384".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha384);
}

#[test]
fn test_parse_rejects_unknown() {
    match "blake3".parse::<HashAlgorithm>() {
        Err(InventoryError::UnsupportedAlgorithm { algorithm }) => assert_eq!(algorithm, "blake3"),
        other => panic!("Expected UnsupportedAlgorithm, got {:?}", other),
    }
}

#[test]
fn test_names_are_upper_case() {
    let names: Vec<String> = HashAlgorithm::ALL.iter().map(|a| a.to_string()).collect();
    assert_eq!(names, ["MD5", "SHA1", "SHA224", "SHA256", "SHA384", "SHA512"]);
}

#[test]
fn test_default_is_md5() {
    assert_eq!(HashAlgorithm::default(), HashAlgorithm::Md5);
}

#[test]
fn test_placeholder_matches_hex_width() {
    let expected = [
        (HashAlgorithm::Md5, 32),
        (HashAlgorithm::Sha1, 40),
        (HashAlgorithm::Sha224, 56),
        (HashAlgorithm::Sha256, 64),
        (HashAlgorithm::Sha384, 96),
        (HashAlgorithm::Sha512, 128),
    ];

    for (algorithm, width) in expected {
        let placeholder = algorithm.placeholder();
        assert_eq!(algorithm.hex_len(), width);
        assert_eq!(placeholder.len(), width, "{}", algorithm);
        assert!(placeholder.chars().all(|c| c == '-'));
    }
}

#[test]
fn test_complete_digest_detection() {
    let md5 = HashAlgorithm::Md5;
    assert!(md5.is_complete_digest("d41d8cd98f00b204e9800998ecf8427e"));
    assert!(md5.is_complete_digest(&md5.placeholder()));
    assert!(!md5.is_complete_digest("d41d8cd98f00b204"));
    assert!(!md5.is_complete_digest(""));
    assert!(!md5.is_complete_digest(&HashAlgorithm::Sha1.placeholder()));
    assert!(!md5.is_complete_digest("d41d8cd98f00b204e9800998ecf8427-"));
}
