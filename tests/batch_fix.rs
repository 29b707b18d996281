use std::fs;
use std::path::Path;

use bundle_crc::batch::{BatchSettings, plan_batch, run_batch};
use bundle_crc::crc32::checksum;
use bundle_crc::progress::BatchProgress;
use bundle_crc::save::SaveOptions;
use bundle_crc::types::BackupMode;
use bundle_crc::utils::PathFilter;

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn settings(backup: Option<BackupMode>, dry_run: bool) -> BatchSettings {
    BatchSettings {
        save: SaveOptions::default(),
        backup,
        threads: 2,
        dry_run,
    }
}

#[test]
fn batch_fixes_in_place_and_counts_results() {
    let root = tempfile::tempdir().unwrap();
    let original = root.path().join("game");
    let modified = root.path().join("mods");
    write(&original.join("a.bundle"), b"original a contents");
    write(&original.join("sub/b.bundle"), b"original b contents");
    write(&original.join("same.bundle"), b"unchanged");
    write(&modified.join("a.bundle"), b"modded a contents!!");
    write(&modified.join("sub/b.bundle"), b"modded b contents, longer");
    write(&modified.join("same.bundle"), b"unchanged");
    write(&modified.join("tiny.bundle"), b"ab");
    write(&original.join("tiny.bundle"), b"needs more room");
    write(&modified.join("orphan.bundle"), b"nobody to match");

    let plan = plan_batch(&original, &modified, None, &PathFilter::default()).unwrap();
    let progress = BatchProgress::hidden();
    let report = run_batch(plan, &settings(Some(BackupMode::Suffix), false), &progress).unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.already_matched, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(progress.position(), 4);

    for name in ["a.bundle", "sub/b.bundle"] {
        let fixed = fs::read(modified.join(name)).unwrap();
        let reference = fs::read(original.join(name)).unwrap();
        assert_eq!(checksum(&fixed), checksum(&reference));
        assert!(modified.join(format!("{name}.bak")).exists());
    }
    assert!(!modified.join("same.bundle.bak").exists());
    assert_eq!(fs::read(modified.join("tiny.bundle")).unwrap(), b"ab");

    let failed = report
        .outcomes
        .iter()
        .find(|o| o.report.is_none())
        .unwrap();
    assert!(failed.modified.ends_with("tiny.bundle"));
    assert!(failed.error.as_deref().unwrap().contains("4-byte patch window"));
}

#[test]
fn batch_mirrors_into_output_dir() {
    let root = tempfile::tempdir().unwrap();
    let original = root.path().join("game");
    let modified = root.path().join("mods");
    let out = root.path().join("fixed");
    write(&original.join("deep/x.bundle"), b"original x");
    write(&modified.join("deep/x.bundle"), b"modded x!!");

    let plan = plan_batch(&original, &modified, Some(&out), &PathFilter::default()).unwrap();
    let report = run_batch(plan, &settings(Some(BackupMode::Suffix), false), &BatchProgress::hidden())
        .unwrap();

    assert_eq!(report.succeeded, 1);
    let fixed = fs::read(out.join("deep/x.bundle")).unwrap();
    assert_eq!(checksum(&fixed), checksum(b"original x"));
    assert_eq!(fs::read(modified.join("deep/x.bundle")).unwrap(), b"modded x!!");
    assert!(!modified.join("deep/x.bundle.bak").exists());
}

#[test]
fn batch_dry_run_leaves_everything() {
    let root = tempfile::tempdir().unwrap();
    let original = root.path().join("game");
    let modified = root.path().join("mods");
    write(&original.join("x.bundle"), b"original x");
    write(&modified.join("x.bundle"), b"modded x!!");

    let plan = plan_batch(&original, &modified, None, &PathFilter::default()).unwrap();
    let report =
        run_batch(plan, &settings(Some(BackupMode::Suffix), true), &BatchProgress::hidden()).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.succeeded, 1);
    assert_eq!(fs::read(modified.join("x.bundle")).unwrap(), b"modded x!!");
    assert!(!modified.join("x.bundle.bak").exists());
}
