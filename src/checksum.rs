use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use crc32fast::Hasher as Crc32;

use crate::coerce::checksums_match;
use crate::crc32::checksum;
use crate::types::{CheckReport, Checksum, FileChecksum};

const STREAM_CHUNK_SIZE: usize = 512 * 1024;

/// Stream a reader through CRC32 without holding it in memory.
pub fn checksum_stream<R: Read>(mut reader: R) -> anyhow::Result<(Checksum, u64)> {
    let mut hasher = Crc32::new();
    let mut processed: u64 = 0;
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        processed = processed.saturating_add(n as u64);
    }
    Ok((Checksum::new(hasher.finalize()), processed))
}

pub fn checksum_file(path: &Path) -> anyhow::Result<FileChecksum> {
    let file =
        File::open(path).with_context(|| format!("opening file for checksum: {path:?}"))?;
    let (crc32, size) =
        checksum_stream(file).with_context(|| format!("reading file for checksum: {path:?}"))?;
    Ok(FileChecksum {
        path: path.to_path_buf(),
        size,
        crc32,
    })
}

fn read_checked(path: &Path) -> anyhow::Result<(Vec<u8>, FileChecksum)> {
    let bytes = fs::read(path).with_context(|| format!("reading file for checksum: {path:?}"))?;
    let report = FileChecksum {
        path: path.to_path_buf(),
        size: bytes.len() as u64,
        crc32: checksum(&bytes),
    };
    Ok((bytes, report))
}

/// CRC32 of `modified`, and of `original` when given, plus whether they agree.
///
/// Both files are loaded and compared through the correction engine, the same
/// code that `fix` relies on. Target lookups for `fix` and `batch` stream
/// through [`checksum_file`] instead.
pub fn compare_files(modified: &Path, original: Option<&Path>) -> anyhow::Result<CheckReport> {
    let (modified_bytes, modified) = read_checked(modified)?;
    let (original, matched) = match original {
        Some(path) => {
            let (original_bytes, original) = read_checked(path)?;
            let matched = checksums_match(&modified_bytes, &original_bytes);
            (Some(original), Some(matched))
        }
        None => (None, None),
    };
    Ok(CheckReport {
        modified,
        original,
        matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(bytes: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn streamed_checksum_matches_table_checksum() {
        // Larger than one chunk so the loop runs more than once.
        let data: Vec<u8> = (0..STREAM_CHUNK_SIZE + 1234).map(|i| (i % 251) as u8).collect();
        let (crc, size) = checksum_stream(std::io::Cursor::new(&data)).unwrap();
        assert_eq!(size, data.len() as u64);
        assert_eq!(crc, crate::crc32::checksum(&data));
    }

    #[test]
    fn empty_file_checksum_is_zero() {
        let f = temp_with(&[]);
        let fc = checksum_file(f.path()).unwrap();
        assert_eq!(fc.size, 0);
        assert_eq!(fc.crc32, Checksum::new(0));
    }

    #[test]
    fn compare_reports_match_state() {
        let a = temp_with(b"123456789");
        let b = temp_with(b"123456789");
        let c = temp_with(b"987654321");

        let same = compare_files(a.path(), Some(b.path())).unwrap();
        assert_eq!(same.matched, Some(true));
        assert_eq!(same.modified.crc32, Checksum::new(0xCBF4_3926));

        let differ = compare_files(a.path(), Some(c.path())).unwrap();
        assert_eq!(differ.matched, Some(false));

        let single = compare_files(a.path(), None).unwrap();
        assert_eq!(single.matched, None);
        assert!(single.original.is_none());
    }

    #[test]
    fn compare_agrees_with_streamed_checksums() {
        let data: Vec<u8> = (0..STREAM_CHUNK_SIZE + 77).map(|i| (i * 7 % 253) as u8).collect();
        let a = temp_with(&data);
        let b = temp_with(b"something else entirely");

        let report = compare_files(a.path(), Some(b.path())).unwrap();
        assert_eq!(report.modified.crc32, checksum_file(a.path()).unwrap().crc32);
        assert_eq!(report.modified.size, data.len() as u64);
        assert_eq!(report.original.unwrap().crc32, checksum_file(b.path()).unwrap().crc32);
        assert_eq!(report.matched, Some(false));

        let missing = a.path().with_extension("missing");
        let err = compare_files(a.path(), Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("reading file for checksum"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = checksum_file(&dir.path().join("nope.bundle")).unwrap_err();
        assert!(err.to_string().contains("opening file for checksum"));
    }
}
