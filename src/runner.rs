// src/runner.rs

//! Command execution with deterministic environment control
//!
//! Runs one reader invocation at a time, captures both output streams, and
//! enforces a per-invocation accepted-exit-code contract. Environment
//! shaping covers two concerns the binaries under test depend on:
//!
//! - Locale pinning: a locale override rewrites every `LC_*` variable and
//!   sets `LANG`/`LC_ALL`, so diagnostic text is stable for matching.
//! - Library path injection: binaries are typically run straight from a
//!   build tree, so the runner probes up to three parent directories of
//!   the executable for the library output directory and injects it into
//!   `LD_LIBRARY_PATH`.
//!
//! Children are waited on with a timeout; a hung fuzzed-input reader is
//! killed and surfaces as a distinct error kind rather than stalling the
//! suite.

use crate::codec;
use crate::config::{DEFAULT_LIB_SUBDIR, HarnessConfig};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Success semantics for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedExit {
    /// Never reject, whatever the child reports
    Any,
    /// Accept exactly these codes; signal deaths (negative) never match
    /// unless listed explicitly
    Codes(Vec<i32>),
}

impl Default for AcceptedExit {
    fn default() -> Self {
        AcceptedExit::Codes(vec![0])
    }
}

impl AcceptedExit {
    /// Build from a code slice
    pub fn codes(codes: &[i32]) -> Self {
        AcceptedExit::Codes(codes.to_vec())
    }

    /// True when the observed code satisfies this contract
    pub fn accepts(&self, code: i32) -> bool {
        match self {
            AcceptedExit::Any => true,
            AcceptedExit::Codes(codes) => codes.contains(&code),
        }
    }
}

/// Per-invocation options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory for the child
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment
    pub env: Vec<(String, String)>,
    /// Locale override for deterministic diagnostic text
    pub locale: Option<String>,
    /// Accepted exit codes
    pub accepted: AcceptedExit,
    /// Timeout override; the harness default applies when unset
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.env.push((name.to_string(), value.to_string()));
        self
    }

    pub fn locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn accept(mut self, codes: &[i32]) -> Self {
        self.accepted = AcceptedExit::codes(codes);
        self
    }

    pub fn accept_any(mut self) -> Self {
        self.accepted = AcceptedExit::Any;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One completed invocation
///
/// Construction already enforced the accepted-exit contract, so holders of
/// a result know the code was within the declared set.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code; signal deaths are reported as the negated signal number
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Shell-quoted rendering of the invocation, for diagnostics
    pub invocation: String,
}

/// Executes external programs on behalf of the harness
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            timeout: config.timeout,
        }
    }

    /// Run an argument vector
    pub fn run(&self, argv: &[&str], opts: &RunOptions) -> Result<ExecutionResult> {
        if argv.is_empty() {
            return Err(Error::Spawn {
                command: String::new(),
                source: std::io::Error::other("empty argument vector"),
            });
        }
        self.execute(argv, shell_string(argv), opts)
    }

    /// Run a literal command line through the shell
    ///
    /// Several cases pipe output or change directory inline; those run the
    /// same way the original invocations did, via `sh -c`.
    pub fn run_shell(&self, line: &str, opts: &RunOptions) -> Result<ExecutionResult> {
        self.execute(&["/bin/sh", "-c", line], line.to_string(), opts)
    }

    fn execute(&self, argv: &[&str], invocation: String, opts: &RunOptions) -> Result<ExecutionResult> {
        let env = build_environment(argv, opts);

        debug!(
            "running from {}: {}",
            opts.cwd
                .as_deref()
                .map(Path::display)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "shell".to_string()),
            invocation
        );

        let mut command = Command::new(argv[0]);
        command
            .args(&argv[1..])
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &opts.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| Error::Spawn {
            command: invocation.clone(),
            source: e,
        })?;

        // Both pipes are drained concurrently with the wait; a child that
        // emits more than the pipe buffer holds would otherwise block on a
        // full pipe until the timeout kills it.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_reader = std::thread::spawn(move || drain(stdout_pipe));
        let stderr_reader = std::thread::spawn(move || drain(stderr_pipe));

        let timeout = opts.timeout.unwrap_or(self.timeout);
        let status = match child.wait_timeout(timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout_reader.join();
                let _ = stderr_reader.join();
                warn!("TIMEOUT {}s: {}", timeout.as_secs(), invocation);
                return Err(Error::Timeout {
                    seconds: timeout.as_secs(),
                    invocation,
                });
            }
        };

        let stdout = codec::decode(&stdout_reader.join().unwrap_or_default());
        let stderr = codec::decode(&stderr_reader.join().unwrap_or_default());
        let exit_code = status
            .code()
            .unwrap_or_else(|| -status.signal().unwrap_or(0));

        if !opts.accepted.accepts(exit_code) {
            warn!("*{:02}: {}", exit_code, invocation);
            for line in stdout.lines().filter(|l| !l.is_empty()) {
                warn!("OUT: {}", line);
            }
            for line in stderr.lines().filter(|l| !l.is_empty()) {
                warn!("ERR: {}", line);
            }
            return Err(Error::ExitStatus {
                code: exit_code,
                invocation,
                stdout,
                stderr,
            });
        }

        for line in stdout.lines().filter(|l| !l.is_empty()) {
            debug!("OUT: {}", line);
        }
        for line in stderr.lines().filter(|l| !l.is_empty()) {
            debug!("ERR: {}", line);
        }

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            invocation,
        })
    }
}

/// Read a captured pipe to the end; sees EOF once the child exits or is
/// killed, so the reader thread never outlives the wait by long.
fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

/// Shell-quoted rendering of an argument vector
pub fn shell_string(argv: &[&str]) -> String {
    argv.iter()
        .map(|arg| format!("'{}'", arg.replace('\'', "\\'")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the child environment: inherited vars, caller overrides, locale
/// rewriting, and library-path injection for build-tree binaries.
fn build_environment(argv: &[&str], opts: &RunOptions) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    for (name, value) in &opts.env {
        env.insert(name.clone(), value.clone());
    }
    if let Some(locale) = &opts.locale {
        let categories: Vec<String> = env
            .keys()
            .filter(|name| name.starts_with("LC_"))
            .cloned()
            .collect();
        for name in categories {
            env.insert(name, locale.clone());
        }
        env.insert("LANG".to_string(), locale.clone()); // message language
        env.insert("LC_ALL".to_string(), locale.clone()); // other categories
    }
    // The shell form carries the real executable inside the `sh -c`
    // payload; the build-tree lookup wants its first token, not the shell.
    let exe = match argv {
        ["/bin/sh", "-c", line, ..] => line.split_whitespace().next().unwrap_or(""),
        _ => argv.first().copied().unwrap_or(""),
    };
    if let Some(libdir) = find_library_dir(Path::new(exe)) {
        env.insert(
            "LD_LIBRARY_PATH".to_string(),
            libdir.display().to_string(),
        );
    }
    env
}

/// Probe up to three parent directories of the executable for the library
/// output directory of an uninstalled build tree.
fn find_library_dir(exe: &Path) -> Option<PathBuf> {
    let real = std::fs::canonicalize(exe).unwrap_or_else(|_| exe.to_path_buf());
    let mut dir = real.parent()?.to_path_buf();
    for _ in 0..3 {
        let candidate = dir.join(DEFAULT_LIB_SUBDIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = match dir.parent() {
            Some(parent) => parent.to_path_buf(),
            None => break,
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> CommandRunner {
        CommandRunner::new(&HarnessConfig::default())
    }

    #[test]
    fn test_accepted_exit_default_is_zero() {
        let accepted = AcceptedExit::default();
        assert!(accepted.accepts(0));
        assert!(!accepted.accepts(1));
    }

    #[test]
    fn test_accepted_exit_any() {
        assert!(AcceptedExit::Any.accepts(255));
        assert!(AcceptedExit::Any.accepts(-9));
    }

    #[test]
    fn test_run_captures_output() {
        let run = runner()
            .run(&["/bin/echo", "hello"], &RunOptions::new())
            .unwrap();
        assert_eq!(run.exit_code, 0);
        assert_eq!(run.stdout, "hello\n");
        assert_eq!(run.stderr, "");
    }

    #[test]
    fn test_run_accepts_declared_nonzero_code() {
        // Scenario A: accepted {0, 66} against a program exiting 66
        let run = runner()
            .run_shell("exit 66", &RunOptions::new().accept(&[0, 66]))
            .unwrap();
        assert_eq!(run.exit_code, 66);
    }

    #[test]
    fn test_run_rejects_undeclared_code() {
        let err = runner()
            .run_shell("exit 3", &RunOptions::new())
            .unwrap_err();
        match err {
            Error::ExitStatus { code, .. } => assert_eq!(code, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_any_never_rejects() {
        let run = runner()
            .run_shell("exit 97", &RunOptions::new().accept_any())
            .unwrap();
        assert_eq!(run.exit_code, 97);
    }

    #[test]
    fn test_rejected_run_carries_both_streams() {
        let err = runner()
            .run_shell("echo out; echo err >&2; exit 9", &RunOptions::new())
            .unwrap_err();
        match err {
            Error::ExitStatus { stdout, stderr, .. } => {
                assert_eq!(stdout, "out\n");
                assert_eq!(stderr, "err\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let err = runner()
            .run_shell(
                "sleep 5",
                &RunOptions::new().timeout(Duration::from_millis(100)),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn test_output_beyond_pipe_buffer_is_fully_captured() {
        // a child filling the pipe must not read as a hang
        let run = runner()
            .run_shell(
                "head -c 200000 /dev/zero | tr '\\0' 'a'",
                &RunOptions::new().timeout(Duration::from_secs(5)),
            )
            .unwrap();
        assert_eq!(run.exit_code, 0);
        assert_eq!(run.stdout.len(), 200_000);
        assert!(run.stdout.bytes().all(|b| b == b'a'));
    }

    #[test]
    fn test_stderr_beyond_pipe_buffer_is_fully_captured() {
        let run = runner()
            .run_shell(
                "head -c 200000 /dev/zero | tr '\\0' 'b' >&2",
                &RunOptions::new().timeout(Duration::from_secs(5)),
            )
            .unwrap();
        assert_eq!(run.exit_code, 0);
        assert_eq!(run.stderr.len(), 200_000);
    }

    #[test]
    fn test_cwd_applies() {
        let dir = tempfile::tempdir().unwrap();
        let run = runner()
            .run_shell("pwd", &RunOptions::new().cwd(dir.path()))
            .unwrap();
        let reported = std::fs::canonicalize(run.stdout.trim()).unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(reported, expected);
    }

    #[test]
    fn test_locale_rewrites_categories() {
        let opts = RunOptions::new()
            .env("LC_MESSAGES", "de_DE.UTF-8")
            .locale("C");
        let env = build_environment(&["/bin/true"], &opts);
        assert_eq!(env.get("LC_MESSAGES").map(String::as_str), Some("C"));
        assert_eq!(env.get("LANG").map(String::as_str), Some("C"));
        assert_eq!(env.get("LC_ALL").map(String::as_str), Some("C"));
    }

    #[test]
    fn test_env_override_reaches_child() {
        let run = runner()
            .run_shell(
                "printf '%s' \"$ZIPDIFF_MARKER\"",
                &RunOptions::new().env("ZIPDIFF_MARKER", "42"),
            )
            .unwrap();
        assert_eq!(run.stdout, "42");
    }

    #[test]
    fn test_shell_form_finds_build_tree_library_dir() {
        let root = tempfile::tempdir().unwrap();
        let libdir = root.path().join(DEFAULT_LIB_SUBDIR);
        std::fs::create_dir_all(&libdir).unwrap();
        let bindir = root.path().join("bins");
        std::fs::create_dir_all(&bindir).unwrap();
        let tool = bindir.join("unzzip-mem");
        std::fs::write(&tool, b"").unwrap();

        let line = format!("{} -l archive.zip", tool.display());
        let env = build_environment(&["/bin/sh", "-c", line.as_str()], &RunOptions::new());
        let injected = env.get("LD_LIBRARY_PATH").cloned().unwrap();
        assert_eq!(
            std::fs::canonicalize(injected).unwrap(),
            std::fs::canonicalize(&libdir).unwrap()
        );
    }

    #[test]
    fn test_argv_form_finds_build_tree_library_dir() {
        let root = tempfile::tempdir().unwrap();
        let libdir = root.path().join(DEFAULT_LIB_SUBDIR);
        std::fs::create_dir_all(&libdir).unwrap();
        let tool = root.path().join("bins/unzzip-big");
        std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
        std::fs::write(&tool, b"").unwrap();

        let tool = tool.display().to_string();
        let env = build_environment(&[tool.as_str(), "-l", "x.zip"], &RunOptions::new());
        let injected = env.get("LD_LIBRARY_PATH").cloned().unwrap();
        assert_eq!(
            std::fs::canonicalize(injected).unwrap(),
            std::fs::canonicalize(&libdir).unwrap()
        );
    }

    #[test]
    fn test_shell_string_quotes_arguments() {
        assert_eq!(shell_string(&["a", "b c"]), "'a' 'b c'");
    }
}
