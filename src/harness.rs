// src/harness.rs

//! The assembled harness
//!
//! One configuration object constructs every component; cases receive the
//! whole bundle and never consult global state.

use crate::artifacts::Workspace;
use crate::config::HarnessConfig;
use crate::fixtures::FixtureCache;
use crate::runner::CommandRunner;
use crate::toolchain::Toolchain;

/// All harness services, built once from a [`HarnessConfig`]
pub struct Harness {
    pub config: HarnessConfig,
    pub runner: CommandRunner,
    pub cache: FixtureCache,
    pub workspace: Workspace,
    pub tools: Toolchain,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            runner: CommandRunner::new(&config),
            cache: FixtureCache::new(&config),
            workspace: Workspace::new(&config),
            tools: Toolchain::new(&config),
            config,
        }
    }
}
