use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::types::{Action, BackupMode, Checksum};

#[derive(Parser, Debug, serde::Serialize)]
#[command(
    name = "bundle-crc",
    version,
    about = "Check and repair the CRC32 of modified asset bundles",
    long_about = include_str!("help_examples.md")
)]
pub struct Cli {
    /// Action to run
    #[arg(value_enum, value_name = "ACTION")]
    pub action: Action,

    // single file options
    /// Modified file to check or fix
    #[arg(short = 'm', long = "modified", value_name = "PATH")]
    pub modified: Option<PathBuf>,

    /// Unmodified file that provides the target CRC32
    #[arg(short = 'o', long = "original", value_name = "PATH")]
    pub original: Option<PathBuf>,

    /// Explicit target CRC32 in hex (instead of --original)
    #[arg(short = 't', long = "target-crc", value_name = "HEX")]
    pub target_crc: Option<Checksum>,

    /// Write the fixed file here instead of rewriting --modified in place
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    // batch options
    #[arg(long = "original-dir", value_name = "DIR")]
    pub original_dir: Option<PathBuf>,
    #[arg(long = "modified-dir", value_name = "DIR")]
    pub modified_dir: Option<PathBuf>,
    /// Mirror fixed files into this directory instead of fixing in place
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    /// Only fix files whose relative path matches (repeatable)
    #[arg(long = "include", value_name = "GLOB", action = ArgAction::Append)]
    pub include: Vec<String>,
    /// Skip files whose relative path matches (repeatable)
    #[arg(long = "exclude", value_name = "GLOB", action = ArgAction::Append)]
    pub exclude: Vec<String>,
    /// Number of worker threads for batch (defaults to logical CPU count)
    #[arg(long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    // correction options
    /// Insert four padding bytes instead of overwriting the last four bytes
    #[arg(long = "padding")]
    pub padding: bool,
    /// Insert the padding before this byte offset
    #[arg(long = "pad-offset", value_name = "N")]
    pub pad_offset: Option<usize>,
    /// Insert the padding this many bytes before the end of the file
    #[arg(long = "pad-from-end", value_name = "N")]
    pub pad_from_end: Option<usize>,
    /// Do not create a backup before fixing a file in place
    #[arg(long = "no-backup")]
    pub no_backup: bool,
    #[arg(long = "backup-mode", value_enum, default_value_t = BackupMode::Suffix)]
    pub backup_mode: BackupMode,
    /// Compute and report the patch without writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    // output options
    /// Print the report as JSON
    #[arg(long = "json")]
    pub json: bool,
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,
}
