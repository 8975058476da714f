// src/toolchain.rs

//! Resolution of the external binaries the harness drives
//!
//! Four independently implemented reader variants live in the configured
//! binary directory; the archive builder and the third-party oracle reader
//! come from the configuration (name or path). The oracle is optional by
//! contract: when it cannot be found, every dependent case degrades to a
//! skip, never a failure.

use crate::config::HarnessConfig;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One of the independently implemented reader strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderVariant {
    /// Streaming reader for large archives
    Big,
    /// In-memory central-directory reader
    Mem,
    /// Hybrid reader
    Mix,
    /// Fallback reader
    Zap,
    /// Trusted third-party reader, used only as a comparison baseline
    Oracle,
}

impl ReaderVariant {
    /// All variants in catalog order
    pub const ALL: [ReaderVariant; 5] = [
        ReaderVariant::Oracle,
        ReaderVariant::Big,
        ReaderVariant::Mem,
        ReaderVariant::Mix,
        ReaderVariant::Zap,
    ];

    /// Binary name under the bindir; the oracle is resolved separately
    fn binary_name(self) -> &'static str {
        match self {
            ReaderVariant::Big => "unzzip-big",
            ReaderVariant::Mem => "unzzip-mem",
            ReaderVariant::Mix => "unzzip-mix",
            ReaderVariant::Zap => "unzzip",
            ReaderVariant::Oracle => "unzip",
        }
    }

    /// Short label used in case names and the results report
    pub fn label(self) -> &'static str {
        match self {
            ReaderVariant::Big => "big",
            ReaderVariant::Mem => "mem",
            ReaderVariant::Mix => "mix",
            ReaderVariant::Zap => "zap",
            ReaderVariant::Oracle => "oracle",
        }
    }
}

impl fmt::Display for ReaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolved paths of the binaries under test and their companions
pub struct Toolchain {
    bindir: PathBuf,
    exeext: String,
    mkzip: String,
    oracle: Option<PathBuf>,
}

impl Toolchain {
    pub fn new(config: &HarnessConfig) -> Self {
        let oracle = resolve_tool(&config.unzip);
        if oracle.is_none() {
            warn!(
                "no oracle reader found (given '{}'), dependent cases will skip",
                config.unzip
            );
        }
        Self {
            bindir: config.bindir.clone(),
            exeext: config.exeext.clone(),
            mkzip: config.mkzip.clone(),
            oracle,
        }
    }

    /// Executable for a reader variant
    ///
    /// Variants under test always resolve to a path below the bindir (a
    /// missing binary surfaces as a spawn failure, which is the right
    /// diagnostic); only the oracle returns `None` when absent.
    pub fn reader(&self, variant: ReaderVariant) -> Option<PathBuf> {
        match variant {
            ReaderVariant::Oracle => self.oracle.clone(),
            other => Some(
                self.bindir
                    .join(format!("{}{}", other.binary_name(), self.exeext)),
            ),
        }
    }

    /// Archive-builder command (name or path, passed through)
    pub fn mkzip(&self) -> &str {
        &self.mkzip
    }

    /// True when the oracle reader is usable on this host
    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }
}

/// Resolve a configured tool name to a runnable path
///
/// Accepts explicit paths as given; bare names go through a PATH lookup.
/// The build system's `-NOTFOUND` placeholder counts as absent.
fn resolve_tool(name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.ends_with("-NOTFOUND") {
        return None;
    }
    if name.contains('/') {
        let path = PathBuf::from(name);
        return path.is_file().then_some(path);
    }
    match which::which(name) {
        Ok(path) => {
            debug!("resolved '{}' to {}", name, path.display());
            Some(path)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain_with(unzip: &str) -> Toolchain {
        let config = HarnessConfig {
            bindir: PathBuf::from("../bins"),
            unzip: unzip.to_string(),
            ..HarnessConfig::default()
        };
        Toolchain::new(&config)
    }

    #[test]
    fn test_variant_resolves_under_bindir() {
        let tools = toolchain_with("");
        let exe = tools.reader(ReaderVariant::Mem).unwrap();
        assert_eq!(exe, PathBuf::from("../bins/unzzip-mem"));
    }

    #[test]
    fn test_exeext_is_appended() {
        let config = HarnessConfig {
            bindir: PathBuf::from("bins"),
            exeext: ".exe".to_string(),
            unzip: String::new(),
            ..HarnessConfig::default()
        };
        let tools = Toolchain::new(&config);
        let exe = tools.reader(ReaderVariant::Zap).unwrap();
        assert_eq!(exe, PathBuf::from("bins/unzzip.exe"));
    }

    #[test]
    fn test_notfound_placeholder_disables_oracle() {
        let tools = toolchain_with("/usr/bin/unzip-NOTFOUND");
        assert!(!tools.has_oracle());
        assert!(tools.reader(ReaderVariant::Oracle).is_none());
    }

    #[test]
    fn test_missing_oracle_path_disables_oracle() {
        let tools = toolchain_with("/nonexistent/dir/unzip");
        assert!(!tools.has_oracle());
    }

    #[test]
    fn test_shell_resolves_from_path() {
        // /bin/sh exists everywhere this suite runs
        assert!(resolve_tool("sh").is_some());
    }
}
