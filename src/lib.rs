// src/lib.rs

//! Differential regression harness for zip-reader binaries
//!
//! Drives several independently implemented archive readers plus a
//! trusted third-party oracle over a catalog of known-bad proof-of-concept
//! archives, and pins what each variant does: graceful rejection, tolerant
//! partial success, or an explicitly tagged divergence from its siblings.
//! The readers are external executables; nothing here parses archives
//! itself.
//!
//! # Architecture
//!
//! - Expectations as data: the catalog carries per-variant checks that one
//!   verification path applies uniformly
//! - Explicit identity: every case declares its artifact name, nothing is
//!   inferred from calling context
//! - Skip over fail: a missing fixture, oracle, or reader binary degrades
//!   the dependent cases to skips
//! - One config object: all run-wide knobs are constructed from the CLI
//!   and threaded into every component

pub mod artifacts;
pub mod cases;
pub mod codec;
pub mod config;
pub mod diagnostics;
mod error;
pub mod fixtures;
pub mod harness;
pub mod runner;
pub mod suite;
pub mod toolchain;
pub mod verify;

pub use config::HarnessConfig;
pub use error::{Error, Result};
pub use harness::Harness;
pub use runner::{AcceptedExit, CommandRunner, ExecutionResult, RunOptions};
pub use suite::{CaseError, CaseResult, SuiteReport, TestCase};
pub use toolchain::ReaderVariant;
