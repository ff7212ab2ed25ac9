//! Site settings management for `settings.json`.
//!
//! Settings are a single JSON mapping persisted with stable key ordering.
//! The manager keeps an in-memory copy behind `arc-swap` so readers are
//! lock-free; writes serialize through the manager: load, mutate in memory,
//! write the whole file, swap the cache.
//!
//! # Example
//!
//! ```json
//! {
//!   "siteTitle": "My Site",
//!   "siteDescription": "A file-backed blog",
//!   "siteUrl": "https://example.com",
//!   "activeTheme": "default",
//!   "postsPerPage": 10
//! }
//! ```

use crate::{
    error::{CoreError, CoreResult},
    hooks,
};
use arc_swap::ArcSwap;
use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fs, path::PathBuf, sync::Arc};

// ============================================================================
// Defaults
// ============================================================================

/// Default values for settings fields, wired through serde.
pub mod defaults {
    pub fn site_title() -> String {
        "My Site".into()
    }

    pub fn active_theme() -> String {
        "default".into()
    }

    pub fn posts_per_page() -> usize {
        10
    }

    pub fn rss_site_language() -> String {
        "en-us".into()
    }

    pub fn static_output_dir() -> String {
        "_site".into()
    }

    pub fn static_clean_urls() -> bool {
        true
    }
}

// ============================================================================
// Settings Record
// ============================================================================

/// The persisted site settings mapping.
///
/// Unknown keys are preserved round-trip in `extra`.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    /// Site title shown in templates and feeds.
    #[serde(default = "defaults::site_title")]
    #[educe(Default = defaults::site_title())]
    pub site_title: String,

    /// Site description for templates and feeds.
    pub site_description: String,

    /// Absolute base URL used for feed links and sitemaps.
    pub site_url: String,

    /// Name of the active theme directory.
    #[serde(default = "defaults::active_theme")]
    #[educe(Default = defaults::active_theme())]
    pub active_theme: String,

    /// Page size for paginated listings.
    #[serde(default = "defaults::posts_per_page")]
    #[educe(Default = defaults::posts_per_page())]
    pub posts_per_page: usize,

    /// BCP 47 language code for the RSS channel.
    #[serde(default = "defaults::rss_site_language")]
    #[educe(Default = defaults::rss_site_language())]
    pub rss_site_language: String,

    /// Copyright line for the RSS channel.
    pub rss_copyright: String,

    /// Default output directory for static generation.
    #[serde(default = "defaults::static_output_dir")]
    #[educe(Default = defaults::static_output_dir())]
    pub static_output_dir: String,

    /// Emit `<path>/index.html` instead of `<path>.html`.
    #[serde(default = "defaults::static_clean_urls")]
    #[educe(Default = defaults::static_clean_urls())]
    pub static_clean_urls: bool,

    /// Minify generated HTML output.
    pub static_minify: bool,

    /// Unrecognized keys, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteSettings {
    /// Base URL with any trailing slash removed. Empty when unset.
    pub fn base_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}

// ============================================================================
// Settings Manager
// ============================================================================

/// Process-wide settings handle with atomic replacement.
///
/// Reads are wait-free via `ArcSwap`; `reload()` re-reads the file on demand
/// for callers that need a force-reload read path.
#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    cache: ArcSwap<SiteSettings>,
}

impl SettingsManager {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing. A malformed file is an `INVALID_JSON` error.
    pub fn load(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let settings = read_settings(&path)?;
        Ok(Self {
            path,
            cache: ArcSwap::from_pointee(settings),
        })
    }

    /// Current settings snapshot. Wait-free.
    pub fn get(&self) -> Arc<SiteSettings> {
        self.cache.load_full()
    }

    /// Re-read settings from disk, replacing the cache.
    pub fn reload(&self) -> CoreResult<Arc<SiteSettings>> {
        let settings = Arc::new(read_settings(&self.path)?);
        self.cache.store(Arc::clone(&settings));
        Ok(settings)
    }

    /// Persist new settings: write the whole file, then swap the cache.
    ///
    /// Fires the `settings_updated` action after a successful write.
    pub fn update(&self, settings: SiteSettings) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(&settings)
            .map_err(|e| CoreError::InvalidJson(self.path.clone(), e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoreError::Io(parent.to_path_buf(), e))?;
        }
        fs::write(&self.path, json).map_err(|e| CoreError::Io(self.path.clone(), e))?;

        let snapshot = serde_json::to_value(&settings).unwrap_or(Value::Null);
        self.cache.store(Arc::new(settings));
        hooks::do_action(hooks::names::SETTINGS_UPDATED, &[snapshot]);
        Ok(())
    }
}

/// Read and parse settings from disk; defaults when the file is absent.
fn read_settings(path: &PathBuf) -> CoreResult<SiteSettings> {
    if !path.exists() {
        return Ok(SiteSettings::default());
    }
    let content = fs::read_to_string(path).map_err(|e| CoreError::Io(path.clone(), e))?;
    serde_json::from_str(&content).map_err(|e| CoreError::InvalidJson(path.clone(), e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = SiteSettings::default();
        assert_eq!(settings.site_title, "My Site");
        assert_eq!(settings.active_theme, "default");
        assert_eq!(settings.posts_per_page, 10);
        assert_eq!(settings.rss_site_language, "en-us");
        assert!(settings.static_clean_urls);
        assert!(!settings.static_minify);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = SettingsManager::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(manager.get().posts_per_page, 10);
    }

    #[test]
    fn test_update_and_reload_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let manager = SettingsManager::load(&path).unwrap();

        let mut settings = SiteSettings::default();
        settings.site_title = "Changed".into();
        settings.posts_per_page = 5;
        manager.update(settings).unwrap();

        assert_eq!(manager.get().site_title, "Changed");

        // A second manager reading the same file sees the write
        let other = SettingsManager::load(&path).unwrap();
        assert_eq!(other.get().posts_per_page, 5);
        assert_eq!(other.reload().unwrap().site_title, "Changed");
    }

    #[test]
    fn test_extra_keys_preserved() {
        let json = r#"{
            "siteTitle": "T",
            "customFlag": true,
            "nested": {"a": 1}
        }"#;
        let settings: SiteSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.extra["customFlag"], serde_json::json!(true));

        let out = serde_json::to_string(&settings).unwrap();
        assert!(out.contains("customFlag"));
        assert!(out.contains("nested"));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let err = SettingsManager::load(&path).unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let mut settings = SiteSettings::default();
        settings.site_url = "https://example.com/".into();
        assert_eq!(settings.base_url(), "https://example.com");
    }
}
