//! SHA-256 checksum utilities for document verification

use crate::error::{GobelError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Compute the SHA-256 checksum of a file, hex-encoded
pub fn compute_file_sha256(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_sha256(&mut file)
}

/// Compute the SHA-256 checksum of any readable source, hex-encoded
pub fn compute_sha256<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 checksum of an in-memory byte slice, hex-encoded
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Verify a file against an expected hex-encoded SHA-256 checksum
pub fn verify_file_sha256(path: impl AsRef<Path>, expected: &str) -> Result<()> {
    let actual = compute_file_sha256(path)?;
    if actual == expected {
        Ok(())
    } else {
        Err(GobelError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn test_compute_sha256() {
        let data = b"hello world";
        let mut cursor = Cursor::new(data);
        let checksum = compute_sha256(&mut cursor).unwrap();
        assert_eq!(
            checksum,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_hex_matches_reader_path() {
        let data = b"gene ontology";
        let mut cursor = Cursor::new(data);
        assert_eq!(compute_sha256(&mut cursor).unwrap(), sha256_hex(data));
    }

    #[test]
    fn test_verify_file_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.obo");
        std::fs::write(&path, b"hello world").unwrap();

        verify_file_sha256(
            &path,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        )
        .unwrap();

        let err = verify_file_sha256(&path, "deadbeef").unwrap_err();
        assert!(matches!(err, GobelError::ChecksumMismatch { .. }));
    }

    proptest! {
        #[test]
        fn prop_sha256_is_stable_and_hex(data: Vec<u8>) {
            let first = sha256_hex(&data);
            let second = sha256_hex(&data);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), 64);
            prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
