use std::path::PathBuf;

use crate::{
    cli::Cli,
    save::SaveOptions,
    types::{Action, BackupMode, Checksum, PadPosition},
};

#[derive(Debug, Clone, serde::Serialize)]
pub struct Config {
    pub action: Action,
    pub modified: Option<PathBuf>,
    pub original: Option<PathBuf>,
    pub target_crc: Option<Checksum>,
    pub output: Option<PathBuf>,
    pub original_dir: Option<PathBuf>,
    pub modified_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// `None` uses one worker per logical CPU.
    pub threads: Option<usize>,
    /// `None` means Overwrite mode.
    pub padding: Option<PadPosition>,
    /// `None` when backups are disabled.
    pub backup: Option<BackupMode>,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: u8,
    pub quiet: u8,
}

impl Config {
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            perform_crc: true,
            padding: self.padding,
        }
    }

    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    fn validate_single_file(&self) -> anyhow::Result<()> {
        match self.action {
            Action::Check => {
                if self.modified.is_none() {
                    anyhow::bail!("check requires --modified");
                }
                if self.target_crc.is_some() {
                    anyhow::bail!("--target-crc is only used by fix");
                }
            }
            Action::Fix => {
                if self.modified.is_none() {
                    anyhow::bail!("fix requires --modified");
                }
                match (&self.original, &self.target_crc) {
                    (None, None) => {
                        anyhow::bail!("fix requires --original or --target-crc")
                    }
                    (Some(_), Some(_)) => {
                        anyhow::bail!("--original and --target-crc cannot be combined")
                    }
                    _ => {}
                }
            }
            Action::Batch => {}
        }
        Ok(())
    }

    fn validate_batch(&self) -> anyhow::Result<()> {
        if self.action != Action::Batch {
            if self.original_dir.is_some() || self.modified_dir.is_some() {
                anyhow::bail!("--original-dir/--modified-dir are only used by batch");
            }
            if self.output_dir.is_some() {
                anyhow::bail!("--output-dir is only used by batch");
            }
            return Ok(());
        }

        if self.original_dir.is_none() || self.modified_dir.is_none() {
            anyhow::bail!("batch requires --original-dir and --modified-dir");
        }
        if self.modified.is_some() || self.original.is_some() || self.target_crc.is_some() {
            anyhow::bail!("batch pairs files by directory; use --original-dir/--modified-dir");
        }
        Ok(())
    }

    fn validate_output_requirements(&self) -> anyhow::Result<()> {
        if self.output.is_some() && self.action != Action::Fix {
            anyhow::bail!("--output is only used by fix");
        }
        Ok(())
    }

    fn validate_threads(&self) -> anyhow::Result<()> {
        if self.threads == Some(0) {
            anyhow::bail!("--threads must be at least 1");
        }
        Ok(())
    }

    fn validate_unused_flags(&self) -> anyhow::Result<()> {
        if self.action != Action::Batch {
            if !self.include.is_empty() || !self.exclude.is_empty() {
                anyhow::bail!("--include/--exclude are only used by batch");
            }
            if self.threads.is_some() {
                anyhow::bail!("--threads is only used by batch");
            }
        }
        if self.action == Action::Check {
            if self.dry_run {
                anyhow::bail!("--dry-run is not used by check");
            }
            if self.padding.is_some() {
                anyhow::bail!("--padding is not used by check");
            }
            if self.backup != Some(BackupMode::Suffix) {
                anyhow::bail!("--no-backup/--backup-mode are not used by check");
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_single_file()?;
        self.validate_batch()?;
        self.validate_output_requirements()?;
        self.validate_threads()?;
        self.validate_unused_flags()?;
        Ok(())
    }
}

fn padding_position(cli: &Cli) -> anyhow::Result<Option<PadPosition>> {
    if !cli.padding {
        if cli.pad_offset.is_some() || cli.pad_from_end.is_some() {
            anyhow::bail!("--pad-offset/--pad-from-end require --padding");
        }
        return Ok(None);
    }

    let position = match (cli.pad_offset, cli.pad_from_end) {
        (Some(_), Some(_)) => anyhow::bail!("--pad-offset and --pad-from-end are mutually exclusive"),
        (Some(offset), None) => PadPosition::Offset(offset),
        (None, Some(back)) => PadPosition::FromEnd(back),
        (None, None) => PadPosition::End,
    };
    Ok(Some(position))
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let padding = padding_position(&cli)?;
        let config = Self {
            action: cli.action,
            modified: cli.modified,
            original: cli.original,
            target_crc: cli.target_crc,
            output: cli.output,
            original_dir: cli.original_dir,
            modified_dir: cli.modified_dir,
            output_dir: cli.output_dir,
            include: cli.include,
            exclude: cli.exclude,
            threads: cli.threads,
            padding,
            backup: (!cli.no_backup).then_some(cli.backup_mode),
            dry_run: cli.dry_run,
            json: cli.json,
            verbose: cli.verbose,
            quiet: cli.quiet,
        };

        config.validate()?;

        Ok(config)
    }
}
