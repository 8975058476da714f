// src/error.rs

//! Harness error types
//!
//! The taxonomy follows the harness design: an exit code outside the
//! accepted set and a child timeout are harness-fatal for the current
//! case; everything else is infrastructure plumbing.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the harness core
#[derive(Error, Debug)]
pub enum Error {
    /// Observed exit code was not in the invocation's accepted set
    #[error("exit code {code} not accepted for: {invocation}")]
    ExitStatus {
        code: i32,
        invocation: String,
        stdout: String,
        stderr: String,
    },

    /// Child process did not finish within the configured timeout
    #[error("timed out after {seconds}s: {invocation}")]
    Timeout { seconds: u64, invocation: String },

    /// Failed to spawn a child process
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error while fetching a fixture
    #[error("fixture download failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid diagnostic search pattern
    #[error("bad pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Invalid case-selection pattern
    #[error("bad case pattern: {0}")]
    CasePattern(#[from] glob::PatternError),

    /// Failed to serialize the results report
    #[error("results serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}
