// src/suite.rs

//! Case registry and suite runner
//!
//! Cases run strictly one after another; isolation between them is by
//! artifact naming, so there is no parallel mode. A case ends in one of
//! three states: passed, failed (assertion mismatch or harness-fatal
//! condition, with the captured streams attached), or skipped (fixture or
//! companion tool unavailable). Skips never count against the suite.

use crate::error::{Error, Result};
use crate::harness::Harness;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Why a case did not pass
#[derive(Debug)]
pub enum CaseError {
    /// Preconditions unavailable (fixture, oracle, reader binary)
    Skipped(String),
    /// Observed behavior differed from the expected contract
    Failed(String),
}

/// Outcome of one case
pub type CaseResult = std::result::Result<(), CaseError>;

impl From<Error> for CaseError {
    fn from(err: Error) -> Self {
        match err {
            // Harness-fatal: dump the full invocation and both streams so
            // the mismatch is diagnosable from the report alone.
            Error::ExitStatus {
                code,
                invocation,
                stdout,
                stderr,
            } => CaseError::Failed(format!(
                "exit code {code} not accepted for {invocation}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}"
            )),
            other => CaseError::Failed(other.to_string()),
        }
    }
}

/// Convenience for assertion helpers in case bodies
pub fn ensure(cond: bool, message: impl Into<String>) -> CaseResult {
    if cond {
        Ok(())
    } else {
        Err(CaseError::Failed(message.into()))
    }
}

type CaseFn = Box<dyn Fn(&Harness) -> CaseResult>;

/// A registered regression case
pub struct TestCase {
    pub name: String,
    run: CaseFn,
}

impl TestCase {
    pub fn new(name: impl Into<String>, run: impl Fn(&Harness) -> CaseResult + 'static) -> Self {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

/// Recorded outcome of one case, for the results file
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    pub name: String,
    #[serde(flatten)]
    pub status: CaseStatus,
    pub duration_ms: u64,
}

/// Aggregate suite outcome, serialized to the results file
#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cases: Vec<CaseRecord>,
}

impl SuiteReport {
    /// True when no case failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// Write the machine-readable report
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Select cases by shell-style name patterns; no patterns selects all.
///
/// A pattern without a wildcard matches as a prefix, so `cve59771` picks
/// up every variant case under that number.
pub fn select(cases: Vec<TestCase>, patterns: &[String]) -> Result<Vec<TestCase>> {
    if patterns.is_empty() {
        return Ok(cases);
    }
    let mut compiled = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let pattern = if pattern.contains('*') {
            pattern.clone()
        } else {
            format!("{pattern}*")
        };
        compiled.push(glob::Pattern::new(&pattern)?);
    }
    Ok(cases
        .into_iter()
        .filter(|case| compiled.iter().any(|p| p.matches(&case.name)))
        .collect())
}

/// Run the selected cases in order, honoring fail-fast
pub fn run_suite(harness: &Harness, cases: Vec<TestCase>) -> SuiteReport {
    let started = Utc::now();
    let mut records = Vec::with_capacity(cases.len());
    let (mut passed, mut failed, mut skipped) = (0, 0, 0);

    for case in &cases {
        let clock = Instant::now();
        let status = match (case.run)(harness) {
            Ok(()) => {
                passed += 1;
                info!("ok   {}", case.name);
                CaseStatus::Passed
            }
            Err(CaseError::Skipped(reason)) => {
                skipped += 1;
                info!("skip {}: {}", case.name, reason);
                CaseStatus::Skipped { reason }
            }
            Err(CaseError::Failed(reason)) => {
                failed += 1;
                warn!("FAIL {}: {}", case.name, reason);
                CaseStatus::Failed { reason }
            }
        };
        let is_failure = matches!(status, CaseStatus::Failed { .. });
        records.push(CaseRecord {
            name: case.name.clone(),
            status,
            duration_ms: clock.elapsed().as_millis() as u64,
        });
        if is_failure && harness.config.failfast {
            warn!("failfast: stopping after {}", case.name);
            break;
        }
    }

    SuiteReport {
        started,
        finished: Utc::now(),
        passed,
        failed,
        skipped,
        cases: records,
    }
}
