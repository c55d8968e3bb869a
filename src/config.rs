//! Configuration loading.
//!
//! Configuration lives in a TOML file under the user's config directory:
//! `~/.config/gazelle-dupe/config.toml` on Linux. Every field has a default,
//! so a missing file or a missing section is not an error.
//!
//! ```toml
//! [dupe_check]
//! various_artist_threshold = 4
//! log_dupe_tolerance = 0.5
//! check_recent_uploads = true
//!
//! [sites.RED]
//! base_url = "https://redacted.sh"
//! session = "..."
//! api_key = "..."
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{DupeError, Result};

// ================================================================================================
// DUPE CHECK
// ================================================================================================

/// Tuning for search-string generation and the log fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DupeCheckConfig {
    /// More main artists than this collapse into `various_artist_word`.
    pub various_artist_threshold: usize,
    pub various_artist_word: String,
    /// Fall back to scraping the site log when structured search is empty.
    pub check_recent_uploads: bool,
    /// Log entries must score strictly above this similarity to be reported.
    pub log_dupe_tolerance: f64,
    /// Number of log pages to crawl.
    pub log_pages: u32,
    /// How many log matches are shown and selectable.
    pub recent_display_limit: usize,
    /// Upper bound on simultaneous search or log requests.
    pub max_concurrent_requests: usize,
    /// Run a log-only check right before upload.
    pub last_minute_dupe_check: bool,
}

impl Default for DupeCheckConfig {
    fn default() -> Self {
        Self {
            various_artist_threshold: 4,
            various_artist_word: "Various Artists".to_string(),
            check_recent_uploads: true,
            log_dupe_tolerance: 0.5,
            log_pages: 10,
            recent_display_limit: 5,
            max_concurrent_requests: 5,
            last_minute_dupe_check: false,
        }
    }
}

impl DupeCheckConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.log_dupe_tolerance) {
            return Err(DupeError::Config(format!(
                "log_dupe_tolerance must be between 0 and 1, got {}",
                self.log_dupe_tolerance
            )));
        }
        if self.max_concurrent_requests == 0 {
            return Err(DupeError::Config(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ================================================================================================
// SITES
// ================================================================================================

/// Connection settings for one tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    /// Value of the `session` cookie.
    pub session: String,
    pub api_key: Option<String>,
    pub user_agent: Option<String>,
    /// Request budget: at most this many requests...
    pub requests_per_window: u32,
    /// ...in any window of this many seconds.
    pub window_seconds: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            session: String::new(),
            api_key: None,
            user_agent: None,
            requests_per_window: 10,
            window_seconds: 10,
        }
    }
}

impl SiteConfig {
    pub fn new(base_url: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: session.into(),
            ..Default::default()
        }
    }

    /// Apply `GAZELLE_DUPE_<CODE>_SESSION` / `GAZELLE_DUPE_<CODE>_API_KEY`.
    fn apply_env_overrides(&mut self, site_code: &str) {
        let prefix = format!("GAZELLE_DUPE_{}", site_code.to_ascii_uppercase());
        if let Ok(session) = std::env::var(format!("{prefix}_SESSION")) {
            self.session = session;
        }
        if let Ok(api_key) = std::env::var(format!("{prefix}_API_KEY")) {
            self.api_key = Some(api_key);
        }
    }
}

// ================================================================================================
// CLIENT
// ================================================================================================

/// Configuration for retry behavior on rate limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (set to 0 to disable retries)
    pub max_retries: u32,
    /// Base delay for exponential backoff (in seconds)
    pub base_delay: u64,
    /// Maximum delay cap (in seconds)
    pub max_delay: u64,
    /// Whether retries are enabled at all
    pub enabled: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 5,
            max_delay: 300, // 5 minutes
            enabled: true,
        }
    }
}

impl RetryConfig {
    /// Create a config with retries disabled
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            enabled: false,
            ..Default::default()
        }
    }

    /// Create a config with custom retry count
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            enabled: max_retries > 0,
            ..Default::default()
        }
    }
}

/// Transport-level settings shared by every site client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

// ================================================================================================
// TOP LEVEL
// ================================================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dupe_check: DupeCheckConfig,
    pub client: ClientConfig,
    pub sites: BTreeMap<String, SiteConfig>,
}

impl Config {
    /// Default location: `<config dir>/gazelle-dupe/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DupeError::Config("Cannot determine user config directory".to_string())
        })?;
        Ok(config_dir.join("gazelle-dupe").join("config.toml"))
    }

    /// Load from `path`, or from [`Config::default_path`] when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::from_toml(&content)
            .map_err(|e| DupeError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("Config loaded from: {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| DupeError::Config(e.to_string()))?;
        config.dupe_check.validate()?;
        Ok(config)
    }

    /// Settings for one site, with environment overrides applied.
    pub fn site(&self, site_code: &str) -> Result<SiteConfig> {
        let mut site = self
            .sites
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(site_code))
            .map(|(_, site)| site.clone())
            .ok_or_else(|| {
                DupeError::Config(format!("No [sites.{site_code}] section configured"))
            })?;
        site.apply_env_overrides(site_code);
        site.base_url = site.base_url.trim_end_matches('/').to_string();
        if site.base_url.is_empty() {
            return Err(DupeError::Config(format!(
                "[sites.{site_code}] is missing base_url"
            )));
        }
        Ok(site)
    }
}
