use clap::ValueEnum;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::CoercionError;

/// Width in bytes of every patch window: one checksum's worth of bits.
pub const WINDOW_WIDTH: usize = 4;

#[derive(Debug, Clone, Serialize, ValueEnum, PartialEq, Eq, Hash, Copy)]
pub enum Action {
    Check,
    Fix,
    Batch,
}

#[derive(Debug, Clone, Serialize, ValueEnum, PartialEq, Eq, Copy)]
pub enum BackupMode {
    /// `<name>.bak` next to the file
    Suffix,
    /// `orig_<name>` next to the file
    Prefix,
}

/// A CRC-32/ISO-HDLC value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum(u32);

impl Checksum {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Checksum {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl FromStr for Checksum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 8 {
            return Err(format!("expected 1-8 hex digits, got {s:?}"));
        }
        u32::from_str_radix(digits, 16)
            .map(Checksum)
            .map_err(|e| format!("invalid CRC32 {s:?}: {e}"))
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Owned byte content of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Bytes in front of the window.
    pub fn prefix(&self, window: PatchWindow) -> &[u8] {
        &self.bytes[..window.offset]
    }

    pub fn window(&self, window: PatchWindow) -> &[u8] {
        &self.bytes[window.offset..window.end()]
    }

    /// Bytes following the window up to the end of the buffer.
    pub fn trailing(&self, window: PatchWindow) -> &[u8] {
        &self.bytes[window.end()..]
    }

    pub fn write_window(&mut self, window: PatchWindow, content: [u8; WINDOW_WIDTH]) {
        self.bytes[window.offset..window.end()].copy_from_slice(&content);
    }

    /// Open a zero-filled gap of [`WINDOW_WIDTH`] bytes at `offset` and return
    /// the window covering it. Bytes from `offset` onward shift right.
    pub fn insert_gap(&mut self, offset: usize) -> Result<PatchWindow, CoercionError> {
        if offset > self.bytes.len() {
            return Err(CoercionError::InsertionOffsetOutOfRange {
                offset,
                len: self.bytes.len(),
            });
        }
        self.bytes
            .splice(offset..offset, std::iter::repeat_n(0u8, WINDOW_WIDTH));
        PatchWindow::new(offset, self.bytes.len())
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A `WINDOW_WIDTH`-byte range that fits inside a buffer of a known length.
///
/// Only [`PatchWindow::new`] and [`PatchWindow::trailing`] construct one, so
/// holding a window for a buffer of that length means slicing cannot go out
/// of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchWindow {
    offset: usize,
    trailing: usize,
}

impl PatchWindow {
    pub fn new(offset: usize, buffer_len: usize) -> Result<Self, CoercionError> {
        let end = offset
            .checked_add(WINDOW_WIDTH)
            .filter(|end| *end <= buffer_len)
            .ok_or(CoercionError::BufferTooShortForWindow {
                len: buffer_len.saturating_sub(offset),
                width: WINDOW_WIDTH,
            })?;
        Ok(Self {
            offset,
            trailing: buffer_len - end,
        })
    }

    /// The last `WINDOW_WIDTH` bytes of a buffer.
    pub fn trailing(buffer_len: usize) -> Result<Self, CoercionError> {
        if buffer_len < WINDOW_WIDTH {
            return Err(CoercionError::BufferTooShortForWindow {
                len: buffer_len,
                width: WINDOW_WIDTH,
            });
        }
        Self::new(buffer_len - WINDOW_WIDTH, buffer_len)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        WINDOW_WIDTH
    }

    pub fn end(&self) -> usize {
        self.offset + WINDOW_WIDTH
    }

    /// Number of bytes after the window.
    pub fn trailing_len(&self) -> usize {
        self.trailing
    }
}

/// Where Pad mode opens its gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PadPosition {
    /// Append after the last byte.
    End,
    /// Insert before the byte at this offset.
    Offset(usize),
    /// Insert this many bytes before the end of the buffer.
    FromEnd(usize),
}

impl PadPosition {
    pub fn resolve(self, len: usize) -> Result<usize, CoercionError> {
        match self {
            PadPosition::End => Ok(len),
            PadPosition::Offset(offset) if offset <= len => Ok(offset),
            PadPosition::Offset(offset) => {
                Err(CoercionError::InsertionOffsetOutOfRange { offset, len })
            }
            PadPosition::FromEnd(back) => len
                .checked_sub(back)
                .ok_or(CoercionError::InsertionOffsetOutOfRange { offset: back, len }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoercionMode {
    /// Rewrite the last four bytes in place.
    Overwrite,
    /// Grow the buffer by four opaque bytes at the given position.
    Pad(PadPosition),
}

impl Default for CoercionMode {
    fn default() -> Self {
        CoercionMode::Overwrite
    }
}

/// Successful outcome of a coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// The buffer already had the target checksum; no byte was touched.
    AlreadyMatched {
        buffer: ByteBuffer,
        checksum: Checksum,
    },
    Corrected {
        buffer: ByteBuffer,
        window: PatchWindow,
        patch: [u8; WINDOW_WIDTH],
        checksum: Checksum,
    },
}

impl Correction {
    pub fn buffer(&self) -> &ByteBuffer {
        match self {
            Correction::AlreadyMatched { buffer, .. } | Correction::Corrected { buffer, .. } => {
                buffer
            }
        }
    }

    pub fn into_buffer(self) -> ByteBuffer {
        match self {
            Correction::AlreadyMatched { buffer, .. } | Correction::Corrected { buffer, .. } => {
                buffer
            }
        }
    }

    pub fn checksum(&self) -> Checksum {
        match self {
            Correction::AlreadyMatched { checksum, .. } | Correction::Corrected { checksum, .. } => {
                *checksum
            }
        }
    }

    pub fn is_corrected(&self) -> bool {
        matches!(self, Correction::Corrected { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileChecksum {
    pub path: PathBuf,
    pub size: u64,
    pub crc32: Checksum,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub modified: FileChecksum,
    pub original: Option<FileChecksum>,
    /// `None` when only one file was given.
    pub matched: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    /// Written as-is because correction was disabled.
    Unchecked,
    AlreadyMatched,
    Corrected {
        patch_offset: usize,
        patch: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub output: PathBuf,
    pub checksum: Checksum,
    #[serde(flatten)]
    pub status: SaveStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub modified: PathBuf,
    pub target: Checksum,
    /// CRC32 of the modified file before correction.
    pub before: Checksum,
    pub backup: Option<PathBuf>,
    pub dry_run: bool,
    /// False for dry runs and for in-place files that already matched.
    pub written: bool,
    pub outcome: SaveOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    #[serde(rename = "no_original")]
    NoOriginal,
    #[serde(rename = "not_a_file")]
    NotAFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoOriginal => write!(f, "no original file at the same relative path"),
            SkipReason::NotAFile => write!(f, "original counterpart is not a regular file"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub modified: PathBuf,
    pub original: PathBuf,
    pub report: Option<FixReport>,
    /// Set when the job failed; nothing was written for it.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub already_matched: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub outcomes: Vec<JobOutcome>,
    pub skipped: Vec<SkippedFile>,
}
