// src/diagnostics.rs

//! Diagnostics filtering and matching
//!
//! Reader binaries mix genuine errors with progress and hint chatter on
//! stderr. Assertions against captured output go through this module so
//! cases count and match only real diagnostic signal, and so errno-based
//! expectations stay portable: the platform's canonical error string is
//! looked up instead of hard-coding message literals.

use crate::error::Result;
use nix::errno::Errno;
use regex::Regex;

/// Lines carrying real diagnostic signal: blank lines and lines tagged as
/// informational are dropped.
pub fn significant_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.contains("DEBUG:"))
        .filter(|line| !line.contains("HINT:"))
        .map(|line| line.trim_end())
        .collect()
}

/// Count of significant diagnostic lines
pub fn significant_count(text: &str) -> usize {
    significant_lines(text).len()
}

/// True when any line of `text` matches the regular expression
pub fn contains_pattern(text: &str, pattern: &str) -> Result<bool> {
    let re = Regex::new(pattern)?;
    Ok(text.lines().any(|line| re.is_match(line.trim_end())))
}

/// Every line matching the regular expression, trailing whitespace trimmed
pub fn all_matches<'a>(text: &'a str, pattern: &str) -> Result<Vec<&'a str>> {
    let re = Regex::new(pattern)?;
    Ok(text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| re.is_match(line))
        .collect())
}

/// Platform-canonical message for an errno constant
pub fn errno_message(errno: Errno) -> String {
    errno.desc().to_string()
}

/// True when the canonical errno message appears in the diagnostics,
/// prefixed by a separating colon the way strerror output is rendered.
pub fn contains_errno(text: &str, errno: Errno) -> bool {
    text.contains(&format!(": {}", errno.desc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significant_lines_drop_noise() {
        let text = "real error\n\nDEBUG: loading disk\nHINT: try -l\nanother error\n";
        assert_eq!(significant_lines(text), vec!["real error", "another error"]);
        assert_eq!(significant_count(text), 2);
    }

    #[test]
    fn test_significant_lines_empty_input() {
        assert!(significant_lines("").is_empty());
        assert!(significant_lines("\n\n").is_empty());
    }

    #[test]
    fn test_contains_pattern() {
        let text = "zzip: did not open test0x.dat\n";
        assert!(contains_pattern(text, "did not open").unwrap());
        assert!(!contains_pattern(text, "signature not found").unwrap());
    }

    #[test]
    fn test_all_matches_collects_lines() {
        let text = "file.1 ok\nfile.2 bad\nfile.3 ok\n";
        let hits = all_matches(text, r"file\.\d ok").unwrap();
        assert_eq!(hits, vec!["file.1 ok", "file.3 ok"]);
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        assert!(contains_pattern("x", "(").is_err());
    }

    #[test]
    fn test_errno_matching() {
        let text = format!("reader: poc.zip: {}\n", errno_message(Errno::ENOENT));
        assert!(contains_errno(&text, Errno::ENOENT));
        assert!(!contains_errno(&text, Errno::EILSEQ));
    }
}
