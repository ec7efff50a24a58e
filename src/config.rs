//! Site configuration module.
//!
//! Handles loading, validating, and merging `almanac.toml`. Stock defaults are
//! overridden by the user file at the site root; every key is optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! title = "Monthly Digest"
//! media_dir = "media"              # Month folders live here
//! assets_dir = "assets"            # Copied into the output
//! links_file = "assets/links.json" # Call-to-action URLs
//! international_dir = "international"          # Under media_dir
//! masters_file = "assets/centralisator.json"   # District/store registry
//!
//! [discovery]
//! window_months = 24               # Current month + 23 before it
//!
//! [probing]
//! method = "head"                  # "head" or "get" for remote sources
//! timeout_secs = 20
//! max_parallel = 8                 # Omit for auto (= CPU cores)
//!
//! [lazy]
//! root_margin = "100px"
//! threshold = 0.01
//! scroll_debounce_ms = 150
//! batch_size = 3
//! stagger_ms = 100
//! batch_interval_ms = 300
//! progressive = true
//! low_quality_delay_ms = 100
//! high_quality_delay_ms = 300
//! verify_images = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the config file at the site root.
pub const CONFIG_FILENAME: &str = "almanac.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `almanac.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title shown in the page header and `<title>`.
    pub title: String,
    /// Directory (relative to the site root) holding the `MM.YYYY` folders.
    pub media_dir: String,
    /// Static assets directory, copied into the output when building locally.
    pub assets_dir: String,
    /// Flat string → URL map used for call-to-action links.
    pub links_file: String,
    /// Folder under `media_dir` holding the undated international items.
    pub international_dir: String,
    /// Coffee-master registry (districts, stores, certifications).
    pub masters_file: String,
    pub discovery: DiscoveryConfig,
    pub probing: ProbingConfig,
    pub lazy: LazyConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Monthly Digest".to_string(),
            media_dir: "media".to_string(),
            assets_dir: "assets".to_string(),
            links_file: "assets/links.json".to_string(),
            international_dir: "international".to_string(),
            masters_file: "assets/centralisator.json".to_string(),
            discovery: DiscoveryConfig::default(),
            probing: ProbingConfig::default(),
            lazy: LazyConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.window_months == 0 || self.discovery.window_months > 240 {
            return Err(ConfigError::Validation(
                "discovery.window_months must be 1-240".into(),
            ));
        }
        if self.media_dir.trim().is_empty() {
            return Err(ConfigError::Validation("media_dir must not be empty".into()));
        }
        if self.international_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "international_dir must not be empty".into(),
            ));
        }
        if self.lazy.batch_size == 0 {
            return Err(ConfigError::Validation(
                "lazy.batch_size must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.lazy.threshold) {
            return Err(ConfigError::Validation(
                "lazy.threshold must be between 0 and 1".into(),
            ));
        }
        if self.probing.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "probing.timeout_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Month discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// How many months to probe, counting the current one.
    pub window_months: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { window_months: 24 }
    }
}

/// HTTP method used for existence probes against remote sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    #[default]
    Head,
    Get,
}

/// Existence probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbingConfig {
    pub method: ProbeMethod,
    /// Per-request timeout for remote sources.
    pub timeout_secs: u64,
    /// Maximum number of concurrent probes.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_parallel: Option<usize>,
}

impl Default for ProbingConfig {
    fn default() -> Self {
        Self {
            method: ProbeMethod::Head,
            timeout_secs: 20,
            max_parallel: None,
        }
    }
}

/// Resolve the effective probe thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never below one
pub fn effective_threads(config: &ProbingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_parallel
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Lazy image loading policy, shared by the build-time image pass and the
/// browser script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyConfig {
    /// Intersection observer root margin (CSS length).
    pub root_margin: String,
    /// Intersection observer threshold (0.0 - 1.0).
    pub threshold: f64,
    /// Quiet period after the last scroll event before queued loads drain.
    pub scroll_debounce_ms: u64,
    /// Queued elements released per batch.
    pub batch_size: usize,
    /// Delay between consecutive loads within a batch.
    pub stagger_ms: u64,
    /// Delay before the next batch is released.
    pub batch_interval_ms: u64,
    /// Load a low-quality variant first when one is declared.
    pub progressive: bool,
    /// Delay before a decoded standard image is applied.
    pub low_quality_delay_ms: u64,
    /// Delay between the low-quality and high-quality loads.
    pub high_quality_delay_ms: u64,
    /// Decode every referenced image at build time.
    pub verify_images: bool,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            root_margin: "100px".to_string(),
            threshold: 0.01,
            scroll_debounce_ms: 150,
            batch_size: 3,
            stagger_ms: 100,
            batch_interval_ms: 300,
            progressive: true,
            low_quality_delay_ms: 100,
            high_quality_delay_ms: 300,
            verify_images: true,
        }
    }
}

impl LazyConfig {
    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    pub fn low_quality_delay(&self) -> Duration {
        Duration::from_millis(self.low_quality_delay_ms)
    }

    pub fn high_quality_delay(&self) -> Duration {
        Duration::from_millis(self.high_quality_delay_ms)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `almanac.toml` from the site root, merged over stock defaults.
///
/// A missing file yields the defaults. An `Option::None` key such as
/// `probing.max_parallel` is absent from the serialized defaults, so the
/// overlay simply adds it.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    let merged = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(stock_defaults_value(), overlay)
    } else {
        stock_defaults_value()
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    log::debug!("loaded config from {}", config_path.display());
    Ok(config)
}

/// Returns a fully-commented stock `almanac.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Almanac Configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Place this file at the site root as almanac.toml.
# Unknown keys will cause an error.

# Site title used in page headers.
title = "Monthly Digest"

# Directory holding the MM.YYYY month folders.
media_dir = "media"

# Static assets (icons, fonts) copied into the output. JSON files are skipped.
assets_dir = "assets"

# Flat JSON object mapping link keys to URLs, e.g.
# { "champion-instagram": "https://instagram.com/..." }
links_file = "assets/links.json"

# Folder under media_dir with undated international items. Each item is a
# sub-folder with a text.json; international-items.json may list them.
international_dir = "international"

# Districts, stores and coffee-master certifications for the masters page.
masters_file = "assets/centralisator.json"

# ---------------------------------------------------------------------------
# Month discovery
# ---------------------------------------------------------------------------
[discovery]
# Number of months probed for a sections.json, counting the current month.
window_months = 24

# ---------------------------------------------------------------------------
# Existence probing
# ---------------------------------------------------------------------------
[probing]
# HTTP method for existence checks against a remote site: "head" or "get".
method = "head"

# Per-request timeout for remote sources, in seconds.
timeout_secs = 20

# Maximum concurrent probes. Omit to auto-detect (= number of CPU cores).
# max_parallel = 8

# ---------------------------------------------------------------------------
# Lazy image loading
# ---------------------------------------------------------------------------
[lazy]
# Intersection observer settings for the browser script.
root_margin = "100px"
threshold = 0.01

# Images becoming visible while the page scrolls are queued, then released
# in batches once scrolling has been quiet for scroll_debounce_ms.
scroll_debounce_ms = 150
batch_size = 3
stagger_ms = 100
batch_interval_ms = 300

# Load the data-src-low variant first when an image has one.
progressive = true
low_quality_delay_ms = 100
high_quality_delay_ms = 300

# Decode every referenced image during the build and report broken ones.
verify_images = true
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.media_dir, "media");
        assert_eq!(config.links_file, "assets/links.json");
        assert_eq!(config.discovery.window_months, 24);
        assert_eq!(config.probing.method, ProbeMethod::Head);
        assert_eq!(config.lazy.scroll_debounce_ms, 150);
        assert_eq!(config.lazy.batch_size, 3);
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(
            r#"
title = "Coffee Digest"

[lazy]
batch_size = 5
"#,
        )
        .unwrap();
        assert_eq!(config.title, "Coffee Digest");
        assert_eq!(config.lazy.batch_size, 5);
        // Untouched values keep their defaults
        assert_eq!(config.lazy.stagger_ms, 100);
        assert_eq!(config.discovery.window_months, 24);
    }

    #[test]
    fn probe_method_parses_lowercase() {
        let config: SiteConfig = toml::from_str("[probing]\nmethod = \"get\"\n").unwrap();
        assert_eq!(config.probing.method, ProbeMethod::Get);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.title, "Monthly Digest");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "media_dir = \"content\"\n\n[probing]\nmax_parallel = 2\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.media_dir, "content");
        assert_eq!(config.probing.max_parallel, Some(2));
        assert_eq!(config.probing.timeout_secs, 20);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "title = ").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[discovery]\nwindow = 3\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn validate_window_zero() {
        let mut config = SiteConfig::default();
        config.discovery.window_months = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_threshold_out_of_range() {
        let mut config = SiteConfig::default();
        config.lazy.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_batch_size_zero() {
        let mut config = SiteConfig::default();
        config.lazy.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[lazy]\nbatch_size = 3\nstagger_ms = 100\n").unwrap();
        let overlay: toml::Value = toml::from_str("[lazy]\nbatch_size = 7\n").unwrap();
        let merged = merge_toml(base, overlay);
        let lazy = merged.get("lazy").unwrap();
        assert_eq!(lazy.get("batch_size").unwrap().as_integer(), Some(7));
        assert_eq!(lazy.get("stagger_ms").unwrap().as_integer(), Some(100));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let merged = merge_toml(
            toml::Value::String("a".into()),
            toml::Value::String("b".into()),
        );
        assert_eq!(merged.as_str(), Some("b"));
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProbingConfig::default()), cores);
    }

    #[test]
    fn validate_rejects_empty_international_dir() {
        let mut config = SiteConfig::default();
        config.international_dir = " ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProbingConfig {
            max_parallel: Some(0),
            ..ProbingConfig::default()
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.title, defaults.title);
        assert_eq!(config.media_dir, defaults.media_dir);
        assert_eq!(config.international_dir, defaults.international_dir);
        assert_eq!(config.masters_file, defaults.masters_file);
        assert_eq!(config.discovery.window_months, defaults.discovery.window_months);
        assert_eq!(config.lazy.batch_interval_ms, defaults.lazy.batch_interval_ms);
        assert_eq!(config.probing.max_parallel, None);
    }
}
