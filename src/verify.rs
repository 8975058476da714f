// src/verify.rs

//! Differential verification protocol
//!
//! Every regression fixture is pushed through the same shape: obtain the
//! fixture, prepare a scratch directory, run a reader variant's listing
//! and full-extraction operations, and check the variant-specific
//! expectation. Variants are allowed to disagree: a graceful rejection, a
//! tolerant partial success, and a tagged known divergence are all
//! assertable outcomes. The point is to pin down exactly which variants
//! currently defend against a malformed input, so a regression in any one
//! of them is caught without requiring all of them to agree.
//!
//! Expectations are data, not code: each catalog entry carries per-variant
//! [`OpCheck`]s that this module applies uniformly.

use crate::artifacts::TestIdentity;
use crate::diagnostics;
use crate::fixtures::FetchOutcome;
use crate::harness::Harness;
use crate::runner::{AcceptedExit, ExecutionResult, RunOptions};
use crate::suite::{CaseError, CaseResult, ensure};
use crate::toolchain::ReaderVariant;
use nix::errno::Errno;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Expected file state in the scratch directory after extraction
#[derive(Debug, Clone)]
pub enum FileCheck {
    /// Entry exists with exactly this many bytes
    Size(u64),
    /// Entry was not written at all
    Absent,
}

/// Expectation for one operation (listing or extraction) of one variant
#[derive(Debug, Clone)]
pub struct OpCheck {
    accept: AcceptedExit,
    stdout_contains: Vec<&'static str>,
    stdout_max: Option<usize>,
    stderr_contains: Vec<&'static str>,
    stderr_contains_any: Vec<&'static [&'static str]>,
    errno: Option<Errno>,
    significant_max: Option<usize>,
    divergence: Option<&'static str>,
    files: Vec<(&'static str, FileCheck)>,
}

impl OpCheck {
    /// Expectation accepting exactly these exit codes
    pub fn exits(codes: &[i32]) -> Self {
        Self {
            accept: AcceptedExit::codes(codes),
            stdout_contains: Vec::new(),
            stdout_max: None,
            stderr_contains: Vec::new(),
            stderr_contains_any: Vec::new(),
            errno: None,
            significant_max: None,
            divergence: None,
            files: Vec::new(),
        }
    }

    pub fn stdout_has(mut self, needle: &'static str) -> Self {
        self.stdout_contains.push(needle);
        self
    }

    /// Stdout must be shorter than this many characters
    pub fn stdout_under(mut self, chars: usize) -> Self {
        self.stdout_max = Some(chars);
        self
    }

    pub fn stderr_has(mut self, needle: &'static str) -> Self {
        self.stderr_contains.push(needle);
        self
    }

    /// Exit-code policy of this expectation
    pub fn accepted(&self) -> &AcceptedExit {
        &self.accept
    }

    /// At least one of these needles must appear in stderr; used where the
    /// oracle's wording changed across releases.
    pub fn stderr_has_any(mut self, needles: &'static [&'static str]) -> Self {
        self.stderr_contains_any.push(needles);
        self
    }

    /// The canonical message for this errno must appear in stderr
    pub fn errno(mut self, errno: Errno) -> Self {
        self.errno = Some(errno);
        self
    }

    /// Fewer than this many significant stderr lines
    pub fn stderr_noise_under(mut self, lines: usize) -> Self {
        self.significant_max = Some(lines);
        self
    }

    /// No significant stderr at all
    pub fn quiet_stderr(self) -> Self {
        self.stderr_noise_under(1)
    }

    /// Extracted entry must have exactly this size
    pub fn writes(mut self, entry: &'static str, size: u64) -> Self {
        self.files.push((entry, FileCheck::Size(size)));
        self
    }

    /// Entry must not be written
    pub fn writes_nothing_at(mut self, entry: &'static str) -> Self {
        self.files.push((entry, FileCheck::Absent));
        self
    }

    /// Tag this expectation as a known divergence from sibling variants.
    ///
    /// The assertion still holds — it pins the historically more
    /// permissive behavior — but the tag keeps the tolerated gap visible
    /// on every run and must be updated deliberately when the underlying
    /// defect is fixed.
    pub fn known_divergence(mut self, note: &'static str) -> Self {
        self.divergence = Some(note);
        self
    }
}

/// Expectations for one reader variant against one fixture
#[derive(Debug, Clone)]
pub struct VariantCheck {
    pub variant: ReaderVariant,
    pub list: OpCheck,
    pub extract: Option<OpCheck>,
}

impl VariantCheck {
    pub fn new(variant: ReaderVariant, list: OpCheck, extract: OpCheck) -> Self {
        Self {
            variant,
            list,
            extract: Some(extract),
        }
    }

    /// Listing-only expectation
    pub fn list_only(variant: ReaderVariant, list: OpCheck) -> Self {
        Self {
            variant,
            list,
            extract: None,
        }
    }
}

/// One catalog entry: a regression fixture plus per-variant expectations
#[derive(Debug, Clone)]
pub struct CveCase {
    /// Case base name; variant labels are appended per registered case
    pub name: &'static str,
    /// Source locator of the proof-of-concept archive
    pub source: &'static str,
    /// Fixture filename under the source
    pub fixture: &'static str,
    /// Expected byte size of the fixture, for the self-check case
    pub fixture_size: Option<u64>,
    pub variants: Vec<VariantCheck>,
}

/// Run one variant of a catalog entry: fetch, list, extract, assert.
pub fn run_cve_variant(harness: &Harness, case: &CveCase, check: &VariantCheck) -> CaseResult {
    let identity = TestIdentity::new(&format!("{}_{}", case.name, check.variant.label()));
    let exe = resolve_reader(harness, check.variant)?;
    let scratch = harness.workspace.scratch_dir(&identity)?;

    let outcome = run_in_scratch(harness, case, check, &exe, &scratch);
    harness.workspace.release_scratch_dir(&identity)?;
    outcome
}

fn run_in_scratch(
    harness: &Harness,
    case: &CveCase,
    check: &VariantCheck,
    exe: &Path,
    scratch: &Path,
) -> CaseResult {
    let archive = acquire_fixture(harness, case, scratch)?;
    let exe = exe.to_string_lossy().into_owned();
    let archive_path = archive.to_string_lossy().into_owned();

    // Listing runs against the cached copy by path.
    let run = harness.runner.run(
        &[exe.as_str(), "-l", archive_path.as_str()],
        &options(harness, &check.list),
    )?;
    apply_checks(&run, &check.list, scratch)?;

    // Extraction runs from inside the scratch directory, matching how the
    // readers are exercised in the field; the oracle needs its overwrite
    // flag since the fixture itself already sits in the directory.
    if let Some(extract) = &check.extract {
        let argv: Vec<&str> = match check.variant {
            ReaderVariant::Oracle => vec![exe.as_str(), "-o", case.fixture],
            _ => vec![exe.as_str(), case.fixture],
        };
        let run = harness.runner.run(
            &argv,
            &options(harness, extract).cwd(scratch),
        )?;
        apply_checks(&run, extract, scratch)?;
    }
    Ok(())
}

/// Fixture-size self-check for a catalog entry
pub fn run_size_check(harness: &Harness, case: &CveCase) -> CaseResult {
    let expected = match case.fixture_size {
        Some(size) => size,
        None => return Ok(()),
    };
    let identity = TestIdentity::new(&format!("{}_size", case.name));
    let scratch = harness.workspace.scratch_dir(&identity)?;
    let outcome = (|| {
        let archive = acquire_fixture(harness, case, &scratch)?;
        let size = std::fs::metadata(&archive).map_err(crate::Error::from)?.len();
        ensure(
            size == expected,
            format!("{}: fixture is {} bytes, expected {}", case.fixture, size, expected),
        )
    })();
    harness.workspace.release_scratch_dir(&identity)?;
    outcome
}

/// Resolve a reader, turning absence into a skip
pub fn resolve_reader(harness: &Harness, variant: ReaderVariant) -> Result<PathBuf, CaseError> {
    let Some(exe) = harness.tools.reader(variant) else {
        return Err(CaseError::Skipped("no oracle reader on this host".to_string()));
    };
    if variant != ReaderVariant::Oracle && !exe.is_file() {
        return Err(CaseError::Skipped(format!(
            "reader binary not built: {}",
            exe.display()
        )));
    }
    std::path::absolute(&exe).map_err(|e| CaseError::from(crate::Error::from(e)))
}

/// Fetch the case's fixture into the scratch directory, or skip
fn acquire_fixture(harness: &Harness, case: &CveCase, scratch: &Path) -> Result<PathBuf, CaseError> {
    match harness.cache.fetch(case.source, case.fixture, Some(scratch))? {
        FetchOutcome::Fetched(path) => Ok(path),
        FetchOutcome::Offline => Err(CaseError::Skipped(format!(
            "downloads disabled, no {}",
            case.fixture
        ))),
        FetchOutcome::Unavailable => Err(CaseError::Skipped(format!(
            "no {} available: {}",
            case.name, case.fixture
        ))),
    }
}

/// Default options for a checked operation
fn options(harness: &Harness, check: &OpCheck) -> RunOptions {
    let mut opts = RunOptions::new().locale(&harness.config.locale);
    opts.accepted = check.accept.clone();
    opts
}

/// Apply one operation's expectations to a completed run
pub fn apply_checks(run: &ExecutionResult, check: &OpCheck, scratch: &Path) -> CaseResult {
    if let Some(note) = check.divergence {
        info!("known divergence: {}", note);
    }
    for needle in &check.stdout_contains {
        ensure(
            run.stdout.contains(needle),
            format!("stdout missing {needle:?} in: {}", run.invocation),
        )?;
    }
    if let Some(max) = check.stdout_max {
        let len = run.stdout.chars().count();
        ensure(
            len < max,
            format!("stdout is {len} chars, expected under {max}: {}", run.invocation),
        )?;
    }
    for needle in &check.stderr_contains {
        ensure(
            run.stderr.contains(needle),
            format!("stderr missing {needle:?} in: {}", run.invocation),
        )?;
    }
    for needles in &check.stderr_contains_any {
        ensure(
            needles.iter().any(|n| run.stderr.contains(n)),
            format!("stderr missing all of {needles:?} in: {}", run.invocation),
        )?;
    }
    if let Some(errno) = check.errno {
        ensure(
            diagnostics::contains_errno(&run.stderr, errno),
            format!(
                "stderr missing errno message {:?} in: {}",
                diagnostics::errno_message(errno),
                run.invocation
            ),
        )?;
    }
    if let Some(max) = check.significant_max {
        let count = diagnostics::significant_count(&run.stderr);
        ensure(
            count < max,
            format!(
                "{count} significant stderr lines, expected under {max}: {}",
                run.invocation
            ),
        )?;
    }
    for (entry, file_check) in &check.files {
        let path = scratch.join(entry);
        match file_check {
            FileCheck::Size(size) => {
                let actual = std::fs::metadata(&path)
                    .map_err(|_| {
                        CaseError::Failed(format!("expected extracted entry {}", path.display()))
                    })?
                    .len();
                ensure(
                    actual == *size,
                    format!("{} is {actual} bytes, expected {size}", path.display()),
                )?;
            }
            FileCheck::Absent => {
                ensure(
                    !path.exists(),
                    format!("{} should not have been written", path.display()),
                )?;
            }
        }
    }
    Ok(())
}

/// Audit that extraction wrote nothing above the working directory.
///
/// `root` is the scratch root; `workdir` is the (possibly nested)
/// directory extraction ran from. Every filesystem entry under the root
/// that did not exist beforehand must live inside the working directory.
pub fn audit_containment(root: &Path, workdir: &Path, preexisting: &[PathBuf]) -> CaseResult {
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| CaseError::Failed(format!("audit walk failed: {e}")))?;
        let path = entry.path();
        if preexisting.iter().any(|p| p == path) {
            continue;
        }
        ensure(
            path.starts_with(workdir),
            format!(
                "extraction escaped the working directory: {} is outside {}",
                path.display(),
                workdir.display()
            ),
        )?;
    }
    Ok(())
}

/// Snapshot of existing paths under a root, for a later containment audit
pub fn snapshot(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_run(stdout: &str, stderr: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            invocation: "'reader' '-l' 'poc.zip'".to_string(),
        }
    }

    #[test]
    fn test_stdout_checks() {
        let scratch = tempfile::tempdir().unwrap();
        let run = fake_run(" 3 test\n", "");
        let check = OpCheck::exits(&[0]).stdout_has(" 3 test").stdout_under(30);
        assert!(apply_checks(&run, &check, scratch.path()).is_ok());

        let check = OpCheck::exits(&[0]).stdout_has("missing entry");
        assert!(apply_checks(&run, &check, scratch.path()).is_err());

        let check = OpCheck::exits(&[0]).stdout_under(5);
        assert!(apply_checks(&run, &check, scratch.path()).is_err());
    }

    #[test]
    fn test_stderr_noise_threshold_ignores_chatter() {
        let scratch = tempfile::tempdir().unwrap();
        let run = fake_run("", "DEBUG: loading disk\nDEBUG: scanning\n");
        let check = OpCheck::exits(&[0]).quiet_stderr();
        assert!(apply_checks(&run, &check, scratch.path()).is_ok());

        let run = fake_run("", "reader: poc.zip: corrupted\n");
        assert!(apply_checks(&run, &check, scratch.path()).is_err());
    }

    #[test]
    fn test_file_expectations() {
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(scratch.path().join("test"), b"abc").unwrap();
        let run = fake_run("", "");

        let check = OpCheck::exits(&[0]).writes("test", 3);
        assert!(apply_checks(&run, &check, scratch.path()).is_ok());

        let check = OpCheck::exits(&[0]).writes("test", 0);
        assert!(apply_checks(&run, &check, scratch.path()).is_err());

        let check = OpCheck::exits(&[0]).writes_nothing_at("test");
        assert!(apply_checks(&run, &check, scratch.path()).is_err());

        let check = OpCheck::exits(&[0]).writes_nothing_at("other");
        assert!(apply_checks(&run, &check, scratch.path()).is_ok());
    }

    #[test]
    fn test_errno_expectation() {
        let scratch = tempfile::tempdir().unwrap();
        let message = diagnostics::errno_message(Errno::EILSEQ);
        let run = fake_run("", &format!("reader: poc.zip: {message}\n"));
        let check = OpCheck::exits(&[0, 2]).errno(Errno::EILSEQ);
        assert!(apply_checks(&run, &check, scratch.path()).is_ok());

        let check = OpCheck::exits(&[0, 2]).errno(Errno::ENOENT);
        assert!(apply_checks(&run, &check, scratch.path()).is_err());
    }

    #[test]
    fn test_containment_audit_flags_escapes() {
        let root = tempfile::tempdir().unwrap();
        let workdir = root.path().join("sub/dir");
        std::fs::create_dir_all(&workdir).unwrap();
        let before = snapshot(root.path());

        std::fs::write(workdir.join("inside.txt"), b"ok").unwrap();
        assert!(audit_containment(root.path(), &workdir, &before).is_ok());

        std::fs::write(root.path().join("escaped.txt"), b"bad").unwrap();
        assert!(audit_containment(root.path(), &workdir, &before).is_err());
    }
}
