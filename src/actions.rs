use std::path::Path;

use anyhow::Context;
use log::info;
use serde::Serialize;

use crate::batch::{BatchSettings, plan_batch, run_batch};
use crate::checksum::{checksum_file, compare_files};
use crate::config::Config;
use crate::progress::BatchProgress;
use crate::save::{FixRequest, fix_file};
use crate::types::{Action, BatchReport, CheckReport, FixReport, SaveStatus};
use crate::utils::{PathFilter, file_hint};

/// Result of one CLI invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionReport {
    Check(CheckReport),
    Fix(FixReport),
    Batch(BatchReport),
}

impl ActionReport {
    /// Whether the process should exit non-zero.
    pub fn is_failure(&self) -> bool {
        match self {
            ActionReport::Batch(report) => report.failed > 0,
            ActionReport::Check(_) | ActionReport::Fix(_) => false,
        }
    }

    /// Human-readable summary lines.
    pub fn render(&self) -> Vec<String> {
        match self {
            ActionReport::Check(report) => render_check(report),
            ActionReport::Fix(report) => render_fix(report),
            ActionReport::Batch(report) => render_batch(report),
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn render_check(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Modified File CRC32: {}  ({})",
        report.modified.crc32,
        file_hint(&report.modified.path)
    )];
    if let Some(original) = &report.original {
        lines.push(format!(
            "Original File CRC32: {}  ({})",
            original.crc32,
            file_hint(&original.path)
        ));
    }
    if let Some(matched) = report.matched {
        lines.push(format!("CRC Match: {}", yes_no(matched)));
    }
    lines
}

fn render_fix(report: &FixReport) -> Vec<String> {
    let mut lines = vec![
        format!("Target CRC32: {}", report.target),
        format!("Modified File CRC32: {}  (before)", report.before),
    ];
    match &report.outcome.status {
        SaveStatus::AlreadyMatched => lines.push("CRC values already match, no fix needed".into()),
        SaveStatus::Corrected {
            patch_offset,
            patch,
        } => lines.push(format!("Patch: {patch} at offset {patch_offset}")),
        SaveStatus::Unchecked => lines.push("CRC correction skipped".into()),
    }
    if let Some(backup) = &report.backup {
        lines.push(format!("Backup: {}", backup.display()));
    }
    if report.written {
        lines.push(format!(
            "Saved: {}  (CRC32 {})",
            report.outcome.output.display(),
            report.outcome.checksum
        ));
    } else if report.dry_run {
        lines.push("Dry run: nothing written".into());
    }
    lines.push(format!(
        "CRC Match: {}",
        yes_no(report.outcome.checksum == report.target)
    ));
    lines
}

fn render_batch(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in &report.outcomes {
        let name = file_hint(&outcome.modified);
        match (&outcome.report, &outcome.error) {
            (Some(fix), _) => match &fix.outcome.status {
                SaveStatus::AlreadyMatched => lines.push(format!("OK    {name} (already matched)")),
                _ => lines.push(format!("FIXED {name} -> {}", fix.outcome.checksum)),
            },
            (None, Some(error)) => lines.push(format!("FAIL  {name}: {error}")),
            (None, None) => lines.push(format!("FAIL  {name}")),
        }
    }
    for skipped in &report.skipped {
        lines.push(format!("SKIP  {}: {}", file_hint(&skipped.path), skipped.reason));
    }
    lines.push(format!(
        "Processed: {} fixed, {} already matched, {} failed, {} skipped{}",
        report.succeeded,
        report.already_matched,
        report.failed,
        report.skipped.len(),
        if report.dry_run { " (dry run)" } else { "" }
    ));
    lines
}

pub fn perform_action(config: &Config) -> anyhow::Result<ActionReport> {
    match config.action {
        Action::Check => run_check(config).map(ActionReport::Check),
        Action::Fix => run_fix(config).map(ActionReport::Fix),
        Action::Batch => run_batch_action(config).map(ActionReport::Batch),
    }
}

fn required<'a>(path: Option<&'a Path>, flag: &str) -> anyhow::Result<&'a Path> {
    path.with_context(|| format!("missing {flag}"))
}

fn run_check(config: &Config) -> anyhow::Result<CheckReport> {
    let modified = required(config.modified.as_deref(), "--modified")?;
    compare_files(modified, config.original.as_deref())
}

fn run_fix(config: &Config) -> anyhow::Result<FixReport> {
    let modified = required(config.modified.as_deref(), "--modified")?;
    let target = match (config.target_crc, config.original.as_deref()) {
        (Some(target), _) => target,
        (None, Some(original)) => checksum_file(original)?.crc32,
        (None, None) => anyhow::bail!("fix requires --original or --target-crc"),
    };
    info!("fixing {} towards CRC32 {target}", modified.display());

    fix_file(&FixRequest {
        modified,
        output: config.output.as_deref(),
        target,
        options: config.save_options(),
        backup: config.backup,
        dry_run: config.dry_run,
    })
}

fn run_batch_action(config: &Config) -> anyhow::Result<BatchReport> {
    let original_dir = required(config.original_dir.as_deref(), "--original-dir")?;
    let modified_dir = required(config.modified_dir.as_deref(), "--modified-dir")?;
    let filter = PathFilter::new(&config.include, &config.exclude)?;

    let plan = plan_batch(
        original_dir,
        modified_dir,
        config.output_dir.as_deref(),
        &filter,
    )?;
    let progress = BatchProgress::new(plan.jobs.len(), config.quiet > 0 || config.json);
    let settings = BatchSettings {
        save: config.save_options(),
        backup: config.backup,
        threads: config.worker_threads(),
        dry_run: config.dry_run,
    };
    run_batch(plan, &settings, &progress)
}
