//! Fixing many modified bundles against their originals at once.
//!
//! Files are paired by relative path: `modified_dir/a/b.bundle` is corrected
//! against `original_dir/a/b.bundle`. Every pair is an independent job, so
//! jobs run on a rayon pool and one failure never affects another.

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{error, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::checksum::checksum_file;
use crate::progress::BatchProgress;
use crate::save::{FixRequest, SaveOptions, fix_file};
use crate::types::{
    BackupMode, BatchReport, FixReport, JobOutcome, SaveStatus, SkipReason, SkippedFile,
};
use crate::utils::{PathFilter, rebase};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchJob {
    pub relative: PathBuf,
    pub modified: PathBuf,
    pub original: PathBuf,
    /// `None` when the modified file is rewritten in place.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchPlan {
    pub jobs: Vec<BatchJob>,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub save: SaveOptions,
    pub backup: Option<BackupMode>,
    pub threads: usize,
    pub dry_run: bool,
}

pub fn plan_batch(
    original_dir: &Path,
    modified_dir: &Path,
    output_dir: Option<&Path>,
    filter: &PathFilter,
) -> anyhow::Result<BatchPlan> {
    if !modified_dir.is_dir() {
        anyhow::bail!("modified directory {modified_dir:?} does not exist or is not a directory");
    }
    if !original_dir.is_dir() {
        anyhow::bail!("original directory {original_dir:?} does not exist or is not a directory");
    }

    let mut plan = BatchPlan::default();
    for entry in WalkDir::new(modified_dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {modified_dir:?}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(modified_dir)
            .with_context(|| format!("{:?} escaped {modified_dir:?}", entry.path()))?
            .to_path_buf();
        if !filter.accepts(&relative) {
            continue;
        }

        let original = rebase(original_dir, &relative);
        let reason = if !original.exists() {
            Some(SkipReason::NoOriginal)
        } else if !original.is_file() {
            Some(SkipReason::NotAFile)
        } else {
            None
        };
        if let Some(reason) = reason {
            warn!("skipping {}: {reason}", relative.display());
            plan.skipped.push(SkippedFile {
                path: entry.path().to_path_buf(),
                reason,
            });
            continue;
        }

        plan.jobs.push(BatchJob {
            output: output_dir.map(|dir| rebase(dir, &relative)),
            modified: entry.path().to_path_buf(),
            original,
            relative,
        });
    }

    info!(
        "batch plan: {} job(s), {} skipped",
        plan.jobs.len(),
        plan.skipped.len()
    );
    Ok(plan)
}

pub fn run_batch(
    plan: BatchPlan,
    settings: &BatchSettings,
    progress: &BatchProgress,
) -> anyhow::Result<BatchReport> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.threads.max(1))
        .build()
        .context("building batch thread pool")?;

    // par_iter keeps the outcomes in plan order.
    let outcomes: Vec<JobOutcome> = pool.install(|| {
        plan.jobs
            .par_iter()
            .map(|job| {
                let outcome = run_job(job, settings);
                progress.file_done(&job.modified);
                outcome
            })
            .collect()
    });

    let mut report = BatchReport {
        dry_run: settings.dry_run,
        skipped: plan.skipped,
        ..BatchReport::default()
    };
    for outcome in &outcomes {
        match &outcome.report {
            Some(r) if r.outcome.status == SaveStatus::AlreadyMatched => {
                report.already_matched += 1
            }
            Some(_) => report.succeeded += 1,
            None => report.failed += 1,
        }
    }
    report.outcomes = outcomes;

    progress.finish(format!(
        "{} fixed, {} already matched, {} failed",
        report.succeeded, report.already_matched, report.failed
    ));
    Ok(report)
}

fn run_job(job: &BatchJob, settings: &BatchSettings) -> JobOutcome {
    match fix_job(job, settings) {
        Ok(report) => JobOutcome {
            modified: job.modified.clone(),
            original: job.original.clone(),
            report: Some(report),
            error: None,
        },
        Err(e) => {
            error!("{}: {e:#}", job.relative.display());
            JobOutcome {
                modified: job.modified.clone(),
                original: job.original.clone(),
                report: None,
                error: Some(format!("{e:#}")),
            }
        }
    }
}

fn fix_job(job: &BatchJob, settings: &BatchSettings) -> anyhow::Result<FixReport> {
    let target = checksum_file(&job.original)?.crc32;
    fix_file(&FixRequest {
        modified: &job.modified,
        output: job.output.as_deref(),
        target,
        options: settings.save,
        backup: settings.backup,
        dry_run: settings.dry_run,
    })
}
