//! JSON settings file: request tuning, scraper identity, proxies and site family.

use crate::fetcher::{FetchConfig, DEFAULT_USER_AGENT};
use meta_parser::SiteProfile;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Failure to read or decode a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("failed to read settings {path}: {source}")]
    Read {
        /// Settings path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is not valid settings JSON.
    #[error("failed to parse settings JSON at {path}: {source}")]
    Parse {
        /// Settings path.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}

/// Whole settings document; every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fetch timing and retry policy.
    pub request: RequestSettings,
    /// Client identity and pool size.
    pub scraper: ScraperSettings,
    /// Proxy URLs keyed by scheme; non-string and blank entries are ignored.
    pub proxy: BTreeMap<String, Value>,
    /// Site family overrides.
    pub site: SiteSettings,
}

/// `request` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    /// Per-request timeout in seconds.
    pub timeout: f64,
    /// Attempts per URL.
    pub max_retries: u32,
    /// Initial backoff in seconds.
    pub backoff_factor: f64,
    /// Stop retrying on the first 4xx.
    pub fail_fast_on_client_error: bool,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timeout: 10.0,
            max_retries: 3,
            backoff_factor: 0.5,
            fail_fast_on_client_error: false,
        }
    }
}

/// `scraper` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// `User-Agent` header; blank means the built-in default.
    pub user_agent: Option<String>,
    /// Worker count; wins over the command line.
    pub concurrency: Option<usize>,
}

/// `site` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Domain family profile and shared-item links must reference.
    pub domain: Option<String>,
}

impl Settings {
    /// Reads and decodes `path`, reporting every failure.
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`, falling back to defaults when it is missing or malformed.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "settings file not found, using built-in defaults");
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(settings) => {
                info!(path = %path.display(), "loaded settings");
                settings
            }
            Err(err) => {
                error!(error = %err, "ignoring settings file, using built-in defaults");
                Self::default()
            }
        }
    }

    /// Fetcher configuration with invalid values replaced by defaults.
    pub fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            timeout: positive_secs("request.timeout", self.request.timeout)
                .unwrap_or(defaults.timeout),
            max_retries: self.request.max_retries,
            backoff_factor: non_negative_secs("request.backoff_factor", self.request.backoff_factor)
                .unwrap_or(defaults.backoff_factor),
            user_agent: self.user_agent().to_string(),
            proxies: self.proxies(),
            fail_fast_on_client_error: self.request.fail_fast_on_client_error,
        }
    }

    /// Configured user agent, or the browser-like default when blank.
    pub fn user_agent(&self) -> &str {
        self.scraper
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|agent| !agent.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// String-valued, non-blank proxy entries.
    pub fn proxies(&self) -> BTreeMap<String, String> {
        self.proxy
            .iter()
            .filter_map(|(scheme, value)| {
                let target = value.as_str()?.trim();
                (!target.is_empty()).then(|| (scheme.clone(), target.to_string()))
            })
            .collect()
    }

    /// Site profile, scoped to the configured domain when one is set.
    pub fn site_profile(&self) -> SiteProfile {
        match self.site.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => SiteProfile::with_domain(domain),
            _ => SiteProfile::default(),
        }
    }

    /// Worker count: the settings value when present, else `requested`. Never zero.
    pub fn concurrency(&self, requested: usize) -> usize {
        self.scraper.concurrency.unwrap_or(requested).max(1)
    }
}

fn positive_secs(key: &str, secs: f64) -> Option<Duration> {
    non_negative_secs(key, secs).filter(|duration| {
        let positive = !duration.is_zero();
        if !positive {
            warn!(key, "setting must be positive, using default");
        }
        positive
    })
}

fn non_negative_secs(key: &str, secs: f64) -> Option<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => Some(duration),
        Err(_) => {
            warn!(key, value = secs, "invalid duration in settings, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_settings(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_document_maps_to_fetch_config() {
        let file = write_settings(
            r#"{
                "request": { "timeout": 2.5, "max_retries": 5, "backoff_factor": 0.25,
                             "fail_fast_on_client_error": true },
                "scraper": { "user_agent": "  metascrape-test/1.0 ", "concurrency": 8 },
                "proxy": { "http": "http://proxy.local:8080", "https": "  ", "socks": 5 },
                "site": { "domain": "example.org" }
            }"#,
        );
        let settings = Settings::from_path(file.path()).unwrap();
        let config = settings.fetch_config();

        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff_factor, Duration::from_millis(250));
        assert!(config.fail_fast_on_client_error);
        assert_eq!(config.user_agent, "metascrape-test/1.0");
        assert_eq!(
            config.proxies,
            BTreeMap::from([("http".to_string(), "http://proxy.local:8080".to_string())])
        );
        assert_eq!(settings.site_profile().domain, "example.org");
        assert_eq!(settings.concurrency(2), 8);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let file = write_settings(r#"{ "request": { "max_retries": 1 } }"#);
        let settings = Settings::from_path(file.path()).unwrap();
        let config = settings.fetch_config();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.backoff_factor, Duration::from_millis(500));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(settings.site_profile(), SiteProfile::default());
        assert_eq!(settings.concurrency(6), 6);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fetch_config(), FetchConfig::default());
    }

    #[test]
    fn malformed_file_uses_defaults() {
        let file = write_settings("{ not json");
        assert!(matches!(
            Settings::from_path(file.path()),
            Err(SettingsError::Parse { .. })
        ));
        assert_eq!(Settings::load(file.path()), Settings::default());
    }

    #[test]
    fn blank_user_agent_falls_back() {
        let file = write_settings(r#"{ "scraper": { "user_agent": "   " } }"#);
        let settings = Settings::load(file.path());
        assert_eq!(settings.user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn invalid_durations_fall_back() {
        let file = write_settings(r#"{ "request": { "timeout": 0, "backoff_factor": -1.0 } }"#);
        let config = Settings::load(file.path()).fetch_config();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.backoff_factor, Duration::from_millis(500));
    }

    #[test]
    fn concurrency_is_never_zero() {
        let file = write_settings(r#"{ "scraper": { "concurrency": 0 } }"#);
        assert_eq!(Settings::load(file.path()).concurrency(4), 1);
        assert_eq!(Settings::default().concurrency(0), 1);
    }
}
