//! Writing patched bundles back to disk.
//!
//! Correction happens fully in memory before anything is written, and the
//! final write goes through a temporary file in the destination directory, so
//! a failed correction never touches the file already on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, info};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::coerce::{coerce, coerce_to};
use crate::crc32::checksum;
use crate::error::CoercionResult;
use crate::types::{
    BackupMode, ByteBuffer, Checksum, CoercionMode, Correction, FixReport, PadPosition,
    SaveOutcome, SaveStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveOptions {
    pub perform_crc: bool,
    /// `None` overwrites the last four bytes; `Some` inserts four bytes there.
    pub padding: Option<PadPosition>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            perform_crc: true,
            padding: None,
        }
    }
}

impl SaveOptions {
    pub fn mode(&self) -> CoercionMode {
        match self.padding {
            Some(position) => CoercionMode::Pad(position),
            None => CoercionMode::Overwrite,
        }
    }
}

/// Bytes ready to be written, and what was done to them.
#[derive(Debug, Clone)]
pub struct PreparedOutput {
    pub bytes: Vec<u8>,
    pub checksum: Checksum,
    pub status: SaveStatus,
}

impl From<Correction> for PreparedOutput {
    fn from(correction: Correction) -> Self {
        match correction {
            Correction::AlreadyMatched { buffer, checksum } => PreparedOutput {
                bytes: buffer.into_vec(),
                checksum,
                status: SaveStatus::AlreadyMatched,
            },
            Correction::Corrected {
                buffer,
                window,
                patch,
                checksum,
            } => PreparedOutput {
                bytes: buffer.into_vec(),
                checksum,
                status: SaveStatus::Corrected {
                    patch_offset: window.offset(),
                    patch: hex::encode(patch),
                },
            },
        }
    }
}

/// Apply the configured correction towards `target` without writing anything.
pub fn prepare(
    modified: Vec<u8>,
    target: Checksum,
    options: &SaveOptions,
) -> CoercionResult<PreparedOutput> {
    if !options.perform_crc {
        return Ok(unchecked(modified));
    }
    coerce_to(target, ByteBuffer::new(modified), options.mode()).map(PreparedOutput::from)
}

fn unchecked(modified: Vec<u8>) -> PreparedOutput {
    let checksum = checksum(&modified);
    PreparedOutput {
        bytes: modified,
        checksum,
        status: SaveStatus::Unchecked,
    }
}

/// Correct `modified` against the file at `reference_path` and write it to
/// `output_path`.
pub fn save_with_correction(
    modified: Vec<u8>,
    reference_path: &Path,
    output_path: &Path,
    options: &SaveOptions,
) -> anyhow::Result<SaveOutcome> {
    let prepared = if options.perform_crc {
        let reference = fs::read(reference_path)
            .with_context(|| format!("reading reference file: {reference_path:?}"))?;
        coerce(&reference, ByteBuffer::new(modified), options.mode())
            .map(PreparedOutput::from)
            .with_context(|| format!("correcting CRC for {output_path:?}"))?
    } else {
        unchecked(modified)
    };
    write_prepared(prepared, output_path)
}

/// Like [`save_with_correction`] with an explicit target checksum.
pub fn save_with_target(
    modified: Vec<u8>,
    target: Checksum,
    output_path: &Path,
    options: &SaveOptions,
) -> anyhow::Result<SaveOutcome> {
    let prepared = prepare(modified, target, options)
        .with_context(|| format!("correcting CRC for {output_path:?}"))?;
    write_prepared(prepared, output_path)
}

pub fn write_prepared(prepared: PreparedOutput, output_path: &Path) -> anyhow::Result<SaveOutcome> {
    write_atomic(output_path, &prepared.bytes)?;
    info!(
        "saved {} ({} bytes, CRC32 {})",
        output_path.display(),
        prepared.bytes.len(),
        prepared.checksum
    );
    Ok(SaveOutcome {
        output: output_path.to_path_buf(),
        checksum: prepared.checksum,
        status: prepared.status,
    })
}

/// Replace `path` with `bytes` via a sibling temporary file. An existing
/// destination keeps its permissions.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("creating directory: {parent:?}"))?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temporary file in {parent:?}"))?;
    tmp.write_all(bytes)
        .with_context(|| format!("writing temporary file for {path:?}"))?;
    tmp.flush()?;
    if path.exists() {
        let permissions = fs::metadata(path)
            .with_context(|| format!("reading permissions of {path:?}"))?
            .permissions();
        tmp.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("copying permissions of {path:?}"))?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {path:?}"))?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// One file to bring to a target CRC32.
#[derive(Debug, Clone)]
pub struct FixRequest<'a> {
    pub modified: &'a Path,
    /// `None` rewrites `modified` in place.
    pub output: Option<&'a Path>,
    pub target: Checksum,
    pub options: SaveOptions,
    /// Only honoured for in-place writes.
    pub backup: Option<BackupMode>,
    pub dry_run: bool,
}

impl FixRequest<'_> {
    fn in_place(&self) -> bool {
        self.output.is_none_or(|o| o == self.modified)
    }
}

/// Read, correct and write back one file.
///
/// An in-place file that already has the target CRC32 is not rewritten and
/// gets no backup. The backup is only taken once the corrected bytes exist.
pub fn fix_file(request: &FixRequest<'_>) -> anyhow::Result<FixReport> {
    let bytes = fs::read(request.modified)
        .with_context(|| format!("reading modified file: {:?}", request.modified))?;
    let before = checksum(&bytes);
    let output = request.output.unwrap_or(request.modified);

    let prepared = prepare(bytes, request.target, &request.options)
        .with_context(|| format!("correcting CRC for {:?}", request.modified))?;

    let unchanged = request.in_place() && prepared.status == SaveStatus::AlreadyMatched;
    if unchanged {
        info!(
            "CRC values already match, no fix needed: {}",
            request.modified.display()
        );
    }

    let mut backup = None;
    let written = !(request.dry_run || unchanged);
    let outcome = if written {
        if let Some(mode) = request.backup.filter(|_| request.in_place()) {
            backup = Some(create_backup(request.modified, mode)?);
        }
        write_prepared(prepared, output)?
    } else {
        SaveOutcome {
            output: output.to_path_buf(),
            checksum: prepared.checksum,
            status: prepared.status,
        }
    };

    Ok(FixReport {
        modified: request.modified.to_path_buf(),
        target: request.target,
        before,
        backup,
        dry_run: request.dry_run,
        written,
        outcome,
    })
}

pub fn backup_path(path: &Path, mode: BackupMode) -> anyhow::Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("cannot derive a backup name for {path:?}"))?;
    let backup_name = match mode {
        BackupMode::Suffix => format!("{name}.bak"),
        BackupMode::Prefix => format!("orig_{name}"),
    };
    Ok(path.with_file_name(backup_name))
}

/// Copy `path` next to itself under its backup name.
pub fn create_backup(path: &Path, mode: BackupMode) -> anyhow::Result<PathBuf> {
    let backup = backup_path(path, mode)?;
    fs::copy(path, &backup).with_context(|| format!("creating backup {backup:?}"))?;
    info!("backup created: {}", backup.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names() {
        let p = Path::new("/data/mod-2024-01-01.bundle");
        assert_eq!(
            backup_path(p, BackupMode::Suffix).unwrap(),
            PathBuf::from("/data/mod-2024-01-01.bundle.bak")
        );
        assert_eq!(
            backup_path(p, BackupMode::Prefix).unwrap(),
            PathBuf::from("/data/orig_mod-2024-01-01.bundle")
        );
        assert!(backup_path(Path::new("/"), BackupMode::Suffix).is_err());
    }

    #[test]
    fn default_options_overwrite_with_crc() {
        let options = SaveOptions::default();
        assert!(options.perform_crc);
        assert_eq!(options.mode(), CoercionMode::Overwrite);
        let padded = SaveOptions {
            padding: Some(PadPosition::End),
            ..SaveOptions::default()
        };
        assert_eq!(padded.mode(), CoercionMode::Pad(PadPosition::End));
    }

    #[test]
    fn prepare_without_crc_leaves_bytes_alone() {
        let options = SaveOptions {
            perform_crc: false,
            padding: None,
        };
        let out = prepare(b"abc".to_vec(), Checksum::new(7), &options).unwrap();
        assert_eq!(out.bytes, b"abc");
        assert_eq!(out.status, SaveStatus::Unchecked);
        assert_eq!(out.checksum, checksum(b"abc"));
    }

    #[test]
    fn prepare_reports_patch_location() {
        let out = prepare(
            b"some modified payload".to_vec(),
            Checksum::new(0x0102_0304),
            &SaveOptions::default(),
        )
        .unwrap();
        assert_eq!(out.checksum, Checksum::new(0x0102_0304));
        match out.status {
            SaveStatus::Corrected {
                patch_offset,
                patch,
            } => {
                assert_eq!(patch_offset, out.bytes.len() - 4);
                assert_eq!(patch, hex::encode(&out.bytes[patch_offset..]));
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.bundle");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }
}
