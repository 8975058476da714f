// src/config.rs

//! Harness configuration
//!
//! All run-wide knobs live in one explicit object constructed from the CLI
//! and threaded into every component. Nothing in the harness consults
//! process-global state for these settings.

use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for reader invocations (30 seconds)
///
/// Fuzzed inputs can hang a reader indefinitely; expiry kills the child
/// and fails the case with a distinct timeout error.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Library output subdirectory probed next to the binaries under test,
/// so freshly built shared libraries resolve without an install step.
pub const DEFAULT_LIB_SUBDIR: &str = "zzip/.libs";

/// Run-wide harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory holding the reader-variant binaries under test
    pub bindir: PathBuf,
    /// Executable extension appended to tool names (e.g. ".exe")
    pub exeext: String,
    /// Directory where per-case scratch artifacts are created
    pub datadir: PathBuf,
    /// Directory backing the fixture cache
    pub downloaddir: PathBuf,
    /// Skip every fixture-dependent case instead of touching the network
    pub no_downloads: bool,
    /// Keep scratch directories and archives after each case
    pub keep_artifacts: bool,
    /// Stop the suite on the first failing case
    pub failfast: bool,
    /// Locale used to pin diagnostic message language for output matching
    pub locale: String,
    /// Timeout applied to every child process
    pub timeout: Duration,
    /// Archive-builder executable (name or path)
    pub mkzip: String,
    /// Oracle reader executable (name or path); empty disables the oracle
    pub unzip: String,
    /// Where to write the machine-readable results report
    pub results: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            bindir: PathBuf::from("../bins"),
            exeext: String::new(),
            datadir: PathBuf::from("."),
            downloaddir: PathBuf::from("tmp.download"),
            no_downloads: false,
            keep_artifacts: false,
            failfast: false,
            locale: "C".to_string(),
            timeout: DEFAULT_TIMEOUT,
            mkzip: "zip".to_string(),
            unzip: "unzip".to_string(),
            results: None,
        }
    }
}

impl HarnessConfig {
    /// Timeout in whole seconds, for diagnostics
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}
