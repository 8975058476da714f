// src/fixtures.rs

//! Fixture acquisition and caching
//!
//! Proof-of-concept archives live at remote locators and are fetched once
//! into a disk-backed cache keyed by source. A failed fetch leaves a
//! zero-length tombstone so the network attempt is never repeated; any
//! cached file below the usability threshold is treated as unavailable,
//! which lets dependent cases skip instead of fail. Offline mode
//! short-circuits before the filesystem is touched at all, so the whole
//! suite can run without network access.

use crate::config::HarnessConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Minimum byte size for a cached fixture to count as usable
///
/// Tombstones are zero-length by construction; a few stray bytes from a
/// broken download are equally useless as archive input.
pub const MIN_FIXTURE_SIZE: u64 = 5;

/// Timeout for fixture downloads (60 seconds)
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a fixture fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Global no-downloads mode; nothing was touched
    Offline,
    /// No usable file exists after all acquisition paths were tried
    Unavailable,
    /// Usable fixture at this path (inside `into` when one was supplied)
    Fetched(PathBuf),
}

impl FetchOutcome {
    /// Availability signal for callers deciding whether to skip
    pub fn is_available(&self) -> bool {
        matches!(self, FetchOutcome::Fetched(_))
    }
}

/// Disk-backed cache of remote proof-of-concept fixtures
pub struct FixtureCache {
    cache_dir: PathBuf,
    offline: bool,
}

impl FixtureCache {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            cache_dir: config.downloaddir.clone(),
            offline: config.no_downloads,
        }
    }

    /// Resolve (source, filename) to a local file, downloading on first
    /// use and copying into `into` when a destination is supplied.
    ///
    /// Idempotent: once a real file or a tombstone exists under the cache
    /// path, no further network request is made for the same pair.
    pub fn fetch(&self, source: &str, filename: &str, into: Option<&Path>) -> Result<FetchOutcome> {
        if self.offline {
            debug!("offline mode, skipping fetch of {}", filename);
            return Ok(FetchOutcome::Offline);
        }

        let subdir = self.cache_dir.join(cache_key(source));
        std::fs::create_dir_all(&subdir)?;
        let cached = subdir.join(filename);

        if !cached.exists() {
            self.copy_developer_download(filename, &cached)?;
        }
        if !cached.exists() {
            info!("need {}", cached.display());
            self.download(source, filename, &cached);
        }

        if !is_usable(&cached) {
            return Ok(FetchOutcome::Unavailable);
        }

        if let Some(into) = into {
            std::fs::create_dir_all(into)?;
            let dest = into.join(filename);
            std::fs::copy(&cached, &dest)?;
            debug!("copied {} -> {}", cached.display(), dest.display());
            return Ok(FetchOutcome::Fetched(dest));
        }
        Ok(FetchOutcome::Fetched(cached))
    }

    /// Fast local fallback: a copy already sitting in the developer's
    /// downloads folder is taken before any network attempt.
    fn copy_developer_download(&self, filename: &str, cached: &Path) -> Result<()> {
        if let Some(downloads) = dirs::download_dir() {
            let local = downloads.join(filename);
            if local.exists() {
                std::fs::copy(&local, cached)?;
                info!("took {} from {}", filename, downloads.display());
            }
        }
        Ok(())
    }

    /// Fetch `source/filename`, rewriting the web "blob" convention to its
    /// raw-content form. Any failure records a tombstone.
    fn download(&self, source: &str, filename: &str, cached: &Path) {
        let url = format!("{}/{}?raw=true", source, filename).replace("/blob/", "/raw/");
        info!("curl {}", url);
        if let Err(e) = fetch_url(&url, cached) {
            // Tombstone so later runs do not retry a known-bad fetch.
            warn!("download failed ({}), recording tombstone", e);
            if let Err(e) = std::fs::write(cached, b"") {
                warn!("could not record tombstone at {}: {}", cached.display(), e);
            }
        }
    }

    /// Prefetch every (source, filename) pair, for download-only mode.
    ///
    /// Returns the number of fixtures now usable in the cache.
    pub fn download_all<'a>(
        &self,
        fixtures: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<usize> {
        let mut usable = 0;
        for (source, filename) in fixtures {
            if self.fetch(source, filename, None)?.is_available() {
                usable += 1;
            }
        }
        Ok(usable)
    }
}

/// URL-safe cache subdirectory name for a source locator
///
/// Distinct sources must never collide even when filenames match.
fn cache_key(source: &str) -> String {
    url::form_urlencoded::byte_serialize(source.as_bytes()).collect()
}

fn is_usable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.len() >= MIN_FIXTURE_SIZE)
        .unwrap_or(false)
}

fn fetch_url(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    let body = response.bytes()?;
    std::fs::write(dest, &body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_in(dir: &Path, offline: bool) -> FixtureCache {
        let config = HarnessConfig {
            downloaddir: dir.to_path_buf(),
            no_downloads: offline,
            ..HarnessConfig::default()
        };
        FixtureCache::new(&config)
    }

    #[test]
    fn test_offline_mode_touches_nothing() {
        // Scenario B: offline fetch returns without creating any file
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), true);
        let outcome = cache
            .fetch("https://example.invalid/poc", "a.zip", None)
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Offline);
        assert!(!outcome.is_available());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_tombstone_counts_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), false);
        let subdir = dir.path().join(cache_key("src"));
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(subdir.join("poc.zip"), b"").unwrap();
        let outcome = cache.fetch("src", "poc.zip", None).unwrap();
        assert_eq!(outcome, FetchOutcome::Unavailable);
    }

    #[test]
    fn test_short_file_counts_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), false);
        let subdir = dir.path().join(cache_key("src"));
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(subdir.join("poc.zip"), b"1234").unwrap();
        let outcome = cache.fetch("src", "poc.zip", None).unwrap();
        assert_eq!(outcome, FetchOutcome::Unavailable);
    }

    #[test]
    fn test_cached_file_is_served_and_copied() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), false);
        let subdir = dir.path().join(cache_key("src"));
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(subdir.join("poc.zip"), b"PK\x03\x04data").unwrap();

        let into = tempfile::tempdir().unwrap();
        let outcome = cache.fetch("src", "poc.zip", Some(into.path())).unwrap();
        match outcome {
            FetchOutcome::Fetched(path) => {
                assert_eq!(path, into.path().join("poc.zip"));
                assert_eq!(std::fs::read(path).unwrap(), b"PK\x03\x04data");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_fetch_is_idempotent_once_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), false);
        let subdir = dir.path().join(cache_key("src"));
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(subdir.join("poc.zip"), b"PK\x03\x04data").unwrap();

        let first = cache.fetch("src", "poc.zip", None).unwrap();
        let second = cache.fetch("src", "poc.zip", None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_sources_never_collide() {
        assert_ne!(cache_key("https://a/x"), cache_key("https://b/x"));
        // keys must be plain directory names
        assert!(!cache_key("https://a/x").contains('/'));
    }
}
