// tests/suite.rs

//! End-to-end runs of the harness against stand-in reader executables.
//!
//! A tiny shell script in a temporary bindir stands in for a reader
//! variant, which exercises the whole path: toolchain resolution, scratch
//! lifecycle, child spawning with the shaped environment, output capture
//! and the per-case checks, without needing the real binaries or network.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use zipdiff::config::HarnessConfig;
use zipdiff::fixtures::FetchOutcome;
use zipdiff::runner::RunOptions;
use zipdiff::suite::{run_suite, select};
use zipdiff::{Harness, TestCase, cases};

fn offline_config(root: &Path) -> HarnessConfig {
    HarnessConfig {
        bindir: root.join("bins"),
        datadir: root.join("data"),
        downloaddir: root.join("cache"),
        no_downloads: true,
        unzip: String::new(),
        ..HarnessConfig::default()
    }
}

fn harness_at(root: &Path) -> Harness {
    std::fs::create_dir_all(root.join("data")).unwrap();
    Harness::new(offline_config(root))
}

fn install_fake_reader(bindir: &Path, name: &str, body: &str) {
    std::fs::create_dir_all(bindir).unwrap();
    let path = bindir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
}

#[test]
fn test_suite_skips_cleanly_without_tools_or_network() {
    // No reader binaries, no oracle, downloads disabled: every case must
    // degrade to a skip and the suite as a whole must succeed.
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());
    let all = cases::all_cases();
    let total = all.len();

    let report = run_suite(&harness, all);
    assert_eq!(report.failed, 0);
    assert_eq!(report.passed, 0);
    assert_eq!(report.skipped, total);
    assert!(report.success());
}

#[test]
fn test_fake_reader_lists_crafted_archive() {
    // The missing-trailer case expects the in-memory reader to print an
    // empty listing and exit zero; a do-nothing script satisfies that.
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());
    install_fake_reader(&harness.config.bindir, "unzzip-mem", "exit 0");

    let selected = select(cases::all_cases(), &["noend_mem".to_string()]).unwrap();
    assert_eq!(selected.len(), 1);
    let report = run_suite(&harness, selected);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_fake_reader_failing_exit_code_fails_the_case() {
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());
    install_fake_reader(&harness.config.bindir, "unzzip-mem", "exit 7");

    let selected = select(cases::all_cases(), &["noend_mem".to_string()]).unwrap();
    let report = run_suite(&harness, selected);
    assert_eq!(report.failed, 1);
    assert!(!report.success());
}

#[test]
fn test_traversal_containment_passes_for_confined_reader() {
    // A reader that writes only into its working directory satisfies the
    // containment audit.
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());
    install_fake_reader(&harness.config.bindir, "unzzip-mem", "echo ok > evil.txt");

    let selected = select(cases::all_cases(), &["traverse_mem".to_string()]).unwrap();
    let report = run_suite(&harness, selected);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_traversal_containment_catches_escaping_reader() {
    // A reader that honors the "../" prefix writes above its working
    // directory; the audit must turn that into a failure.
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());
    install_fake_reader(
        &harness.config.bindir,
        "unzzip-mem",
        "echo escaped > ../../evil.txt",
    );

    let selected = select(cases::all_cases(), &["traverse_mem".to_string()]).unwrap();
    let report = run_suite(&harness, selected);
    assert_eq!(report.failed, 1);
}

#[test]
fn test_accepted_exit_codes_through_harness() {
    // A configured nonzero exit code is a normal completion, not an error.
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());

    let opts = RunOptions::new().accept(&[0, 66]);
    let run = harness.runner.run_shell("exit 66", &opts).unwrap();
    assert_eq!(run.exit_code, 66);

    let err = harness
        .runner
        .run_shell("exit 7", &RunOptions::new())
        .unwrap_err();
    assert!(matches!(err, zipdiff::Error::ExitStatus { code: 7, .. }));
}

#[test]
fn test_offline_cache_touches_nothing() {
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());

    let outcome = harness
        .cache
        .fetch("https://example.invalid/poc", "poc.zip", None)
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Offline);
    assert!(!harness.config.downloaddir.exists());
}

#[test]
fn test_report_round_trips_as_json() {
    let root = tempfile::tempdir().unwrap();
    let harness = harness_at(root.path());
    let cases = vec![
        TestCase::new("first", |_| Ok(())),
        TestCase::new("second", |_| {
            Err(zipdiff::CaseError::Skipped("no fixture".to_string()))
        }),
    ];

    let report = run_suite(&harness, cases);
    let path = root.path().join("results.json");
    report.write(&path).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed["passed"], 1);
    assert_eq!(parsed["skipped"], 1);
    assert_eq!(parsed["failed"], 0);
    assert_eq!(parsed["cases"][0]["name"], "first");
    assert_eq!(parsed["cases"][0]["status"], "passed");
    assert_eq!(parsed["cases"][1]["status"], "skipped");
    assert_eq!(parsed["cases"][1]["reason"], "no fixture");
}
