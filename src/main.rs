// src/main.rs

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use zipdiff::config::{DEFAULT_TIMEOUT, HarnessConfig};
use zipdiff::suite::{run_suite, select};
use zipdiff::{Harness, cases};

#[derive(Parser)]
#[command(name = "zipdiff")]
#[command(author, version, about = "Differential regression harness for zip-reader binaries", long_about = None)]
struct Cli {
    /// Case name patterns to run (prefix or shell-style glob); all by default
    patterns: Vec<String>,

    /// Directory holding the reader binaries under test
    #[arg(short, long, default_value = "../bins")]
    bindir: PathBuf,

    /// Executable extension appended to tool names (e.g. ".exe")
    #[arg(short = 'E', long, default_value = "")]
    exeext: String,

    /// Directory for per-case scratch artifacts
    #[arg(short = 't', long = "testdatadir", default_value = ".")]
    datadir: PathBuf,

    /// Directory backing the fixture cache
    #[arg(short, long, default_value = "tmp.download")]
    downloaddir: PathBuf,

    /// Never touch the network; fixture-dependent cases skip
    #[arg(short, long)]
    no_downloads: bool,

    /// Prefetch every catalog fixture into the cache, then exit
    #[arg(short = 'D', long)]
    download_only: bool,

    /// Keep scratch directories and archives after each case
    #[arg(short = 'K', long = "keep")]
    keep_artifacts: bool,

    /// Stop on the first failing case
    #[arg(long)]
    failfast: bool,

    /// Write a JSON results report to this file
    #[arg(long, value_name = "FILE")]
    results: Option<PathBuf>,

    /// Archive-builder executable (name or path)
    #[arg(short = 'Z', long, default_value = "zip")]
    mkzip: String,

    /// Oracle reader executable (name or path); empty disables the oracle
    #[arg(short = 'U', long, default_value = "unzip")]
    unzip: String,

    /// Timeout in seconds for every child process
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// More logging (-v info is the default floor, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    let config = HarnessConfig {
        bindir: cli.bindir,
        exeext: cli.exeext,
        datadir: cli.datadir,
        downloaddir: cli.downloaddir,
        no_downloads: cli.no_downloads,
        keep_artifacts: cli.keep_artifacts,
        failfast: cli.failfast,
        locale: "C".to_string(),
        timeout: Duration::from_secs(cli.timeout),
        mkzip: cli.mkzip,
        unzip: cli.unzip,
        results: cli.results,
    };
    let harness = Harness::new(config);

    if cli.download_only {
        let total = cases::fixture_sources().len();
        let usable = harness.cache.download_all(cases::fixture_sources())?;
        info!("{usable} of {total} fixtures usable in the cache");
        if usable < total {
            std::process::exit(1);
        }
        return Ok(());
    }

    let selected = select(cases::all_cases(), &cli.patterns)?;
    if selected.is_empty() {
        anyhow::bail!("no cases match the given patterns");
    }
    info!("running {} cases", selected.len());

    let report = run_suite(&harness, selected);
    info!(
        "{} passed, {} failed, {} skipped",
        report.passed, report.failed, report.skipped
    );
    if let Some(path) = &harness.config.results {
        report.write(path)?;
        info!("results written to {}", path.display());
    }

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}
