//! Client configuration.
//!
//! Loaded from `<home>/config.toml`; every field has a serde default so an
//! empty or missing file yields a working configuration. The base URL can be
//! overridden with `VISUALOOM_BASE_URL`, and the CLI applies its own flags on
//! top of whatever this module resolves.

use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "VISUALOOM_HOME";

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "VISUALOOM_BASE_URL";

const CONFIG_FILENAME: &str = "config.toml";

// ============================================================================
// Default Functions
// ============================================================================

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_polls() -> u32 {
    1800 // one hour at the default interval
}

fn default_recents_limit() -> usize {
    10
}

fn default_page_size() -> usize {
    50
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend root, e.g. `http://localhost:8000`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound for a single HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Delay between job status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on a job after this many polls. `0` polls until the job ends.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    /// How many recently visited paths the explorer remembers
    #[serde(default = "default_recents_limit")]
    pub recents_limit: usize,
    /// Explorer page size
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Ask the backend for image files as well as folders when browsing
    #[serde(default)]
    pub include_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            recents_limit: default_recents_limit(),
            page_size: default_page_size(),
            include_files: false,
        }
    }
}

impl Config {
    /// Load `<home>/config.toml`, falling back to defaults when the file is absent.
    ///
    /// A file that exists but does not parse is an error rather than a silent
    /// fallback, so a typo never points the client at the wrong backend.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join(CONFIG_FILENAME);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content)
                .map_err(|e| ApiError::Config(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        if let Ok(url) = std::env::var(BASE_URL_ENV)
            && !url.trim().is_empty()
        {
            config.base_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject values that would make the client unusable.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| ApiError::Config(format!("base_url '{}': {}", self.base_url, e)))?;
        if self.request_timeout_secs == 0 {
            return Err(ApiError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ApiError::Config(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ApiError::Config("page_size must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Poll bound as an option; `None` means unbounded.
    pub fn poll_limit(&self) -> Option<u32> {
        (self.max_polls > 0).then_some(self.max_polls)
    }
}

/// Resolve the home directory: `VISUALOOM_HOME`, then `~/.visualoom`.
pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = explicit {
        return Ok(home);
    }
    if let Ok(home) = std::env::var(HOME_ENV)
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }
    dirs_next::home_dir()
        .map(|h| h.join(".visualoom"))
        .ok_or_else(|| ApiError::Config("could not determine home directory".to_string()))
}
