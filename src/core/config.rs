//! Configuration management for docs-differ
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/docs-differ/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{DifferError, Result};
use crate::core::types::DeviceProfile;

/// Main configuration for docs-differ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Crawl configuration
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Screenshot configuration
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Output directories
    #[serde(default)]
    pub output: OutputConfig,
    /// Diff configuration
    #[serde(default)]
    pub diff: DiffConfig,
}

/// Crawl behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of pages visited in parallel
    /// Default: 10
    pub concurrency: usize,
    /// Maximum number of pages captured per session (None = unlimited)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_limit: Option<usize>,
    /// Path prefix links must contain to be followed.
    /// Derived from the root URL when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_path: Option<String>,
    /// Only follow links whose path contains `.html`
    pub require_html_suffix: bool,
    /// Immediate re-navigations after an unsuccessful page load
    /// Default: 5
    pub max_navigation_retries: usize,
}

/// Screenshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Take desktop screenshots
    pub desktop: bool,
    /// Take mobile screenshots
    pub mobile: bool,
    /// Wait before each screenshot, in ms
    /// Default: 100
    pub settle_delay_ms: u64,
    /// Normalize install/version/usage snippets before capturing
    pub scrub_content: bool,
    /// Device emulated for mobile screenshots
    pub mobile_device: DeviceProfile,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// agent-browser executable
    pub binary: String,
    /// Prefix for agent-browser session names (one session per worker)
    pub session_prefix: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
}

/// Where screenshots and diffs are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub baseline_dir: PathBuf,
    pub current_dir: PathBuf,
    pub diff_dir: PathBuf,
}

/// Screenshot comparison configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Sensitivity threshold handed to the differ (0.0 - 1.0)
    /// Default: 0.03
    pub threshold: f64,
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| v == "true" || v == "1")
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            concurrency: env::var("DOCS_DIFFER_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(10),
            screenshot_limit: env::var("DOCS_DIFFER_SCREENSHOT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0),
            root_path: None,
            require_html_suffix: env_flag("DOCS_DIFFER_REQUIRE_HTML").unwrap_or(false),
            max_navigation_retries: 5,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            mobile: true,
            settle_delay_ms: env::var("DOCS_DIFFER_SETTLE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            scrub_content: env_flag("DOCS_DIFFER_SCRUB").unwrap_or(false),
            mobile_device: DeviceProfile::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary: env::var("DOCS_DIFFER_BROWSER_BIN")
                .unwrap_or_else(|_| "agent-browser".to_string()),
            session_prefix: env::var("DOCS_DIFFER_BROWSER_SESSION")
                .unwrap_or_else(|_| "docs-differ".to_string()),
            headed: env_flag("DOCS_DIFFER_BROWSER_HEADED").unwrap_or(false),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        let root = PathBuf::from("docs-differ");
        Self {
            baseline_dir: root.join("baseline"),
            current_dir: root.join("current"),
            diff_dir: root.join("diff"),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { threshold: 0.03 }
    }
}

impl CaptureConfig {
    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docs-differ")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults.
    /// Values in the config file win; env vars only fill what the file
    /// leaves unset. CLI flags are applied on top by the caller.
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(DifferError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| DifferError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DifferError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| DifferError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DifferError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| DifferError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }

    /// Reject settings the crawler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.crawl.concurrency == 0 {
            return Err(DifferError::config("concurrency must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.diff.threshold) {
            return Err(DifferError::config(format!(
                "diff threshold must be between 0 and 1, got {}",
                self.diff.threshold
            )));
        }
        if !self.capture.desktop && !self.capture.mobile {
            tracing::warn!("desktop and mobile screenshots are both disabled, nothing will be captured");
        }
        Ok(())
    }
}
