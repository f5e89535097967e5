//! Whole-file CRC32 checksums for dictionary staleness checks.

use std::path::Path;

use lexica_common::error::Error;

/// Accumulates a CRC32 over the content of one or more files, in the order
/// they are processed.
#[derive(Default)]
pub struct ChecksumComputer {
    hasher: crc32fast::Hasher,
}

impl ChecksumComputer {
    pub fn new() -> ChecksumComputer {
        Default::default()
    }

    pub fn new_with_initial(initial: u32) -> ChecksumComputer {
        ChecksumComputer {
            hasher: crc32fast::Hasher::new_with_initial(initial),
        }
    }

    pub fn process_file(&mut self, path: impl AsRef<Path>) -> lexica_common::Result<()> {
        let path = path.as_ref();
        let content = std::fs::read(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        self.hasher.update(&content);
        Ok(())
    }

    pub fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

/// The CRC32 of a single file's content.
pub fn checksum_file(path: impl AsRef<Path>) -> lexica_common::Result<u32> {
    let mut computer = ChecksumComputer::new();
    computer.process_file(path)?;
    Ok(computer.checksum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"dictionary content").expect("write");
        let a = checksum_file(&path).expect("checksum");
        let b = checksum_file(&path).expect("checksum");
        assert_eq!(a, b);
    }

    #[test]
    fn test_checksum_tracks_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"before").expect("write");
        let before = checksum_file(&path).expect("checksum");
        std::fs::write(&path, b"after").expect("write");
        let after = checksum_file(&path).expect("checksum");
        assert_ne!(before, after);
    }

    #[test]
    fn test_multi_file_accumulation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"aa").expect("write");
        std::fs::write(&b, b"bb").expect("write");

        let mut computer = ChecksumComputer::new();
        computer.process_file(&a).expect("process a");
        computer.process_file(&b).expect("process b");
        let combined = computer.checksum();
        assert_ne!(combined, checksum_file(&a).expect("checksum"));
        assert_ne!(combined, checksum_file(&b).expect("checksum"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut computer = ChecksumComputer::new();
        assert!(computer.process_file(dir.path().join("absent")).is_err());
    }
}
