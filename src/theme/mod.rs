//! Theme discovery and management.
//!
//! Themes live under `<data root>/themes/<name>/` with a `theme.json`
//! metadata file, a `templates/` subtree, an optional `custom/` subtree for
//! slug-addressed overrides, and an `assets/` subtree.
//!
//! The manager owns theme directory traversal and keeps an in-memory index
//! refreshed on demand; the active theme is an indirection through site
//! settings with a fallback to the bundled `default` theme.

pub mod menu;
pub mod resolver;

use crate::{
    error::{CoreError, CoreResult},
    log,
    settings::{SettingsManager, SiteSettings},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Fallback theme name when the configured one is missing.
const DEFAULT_THEME: &str = "default";

// ============================================================================
// Types
// ============================================================================

/// Parsed `theme.json` metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeInfo {
    pub title: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub screenshot: String,
    pub features: Vec<String>,
    pub tags: Vec<String>,
}

/// One installed theme with its resolved directory layout.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub info: ThemeInfo,
    pub root: PathBuf,
    pub templates_dir: PathBuf,
    pub custom_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl Theme {
    pub(crate) fn from_dir(root: PathBuf) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let info = read_theme_info(&root.join("theme.json"));
        Self {
            templates_dir: root.join("templates"),
            custom_dir: root.join("custom"),
            assets_dir: root.join("assets"),
            name,
            info,
            root,
        }
    }

    /// Resolve `<theme>/templates/<name>`. Existence is the caller's check.
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.templates_dir.join(name)
    }

    /// Resolve `<theme>/<dir>/<name>`.
    pub fn custom_template_path(&self, dir: &str, name: &str) -> PathBuf {
        self.root.join(dir).join(name)
    }
}

// ============================================================================
// Theme Manager
// ============================================================================

/// Scans and indexes the themes directory.
pub struct ThemeManager {
    themes_root: PathBuf,
    index: RwLock<Vec<Theme>>,
}

impl ThemeManager {
    pub fn new(themes_root: impl Into<PathBuf>) -> Self {
        let manager = Self {
            themes_root: themes_root.into(),
            index: RwLock::new(Vec::new()),
        };
        manager.refresh();
        manager
    }

    /// Rebuild the in-memory index from the filesystem.
    pub fn refresh(&self) {
        let mut themes: Vec<Theme> = match fs::read_dir(&self.themes_root) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .map(Theme::from_dir)
                .collect(),
            Err(_) => Vec::new(),
        };
        themes.sort_by(|a, b| a.name.cmp(&b.name));
        *self.index.write() = themes;
    }

    /// All installed themes.
    pub fn available_themes(&self) -> Vec<Theme> {
        self.index.read().clone()
    }

    /// Look up one theme by name.
    pub fn theme(&self, name: &str) -> Option<Theme> {
        self.index.read().iter().find(|t| t.name == name).cloned()
    }

    /// The active theme per settings, falling back to the bundled default,
    /// then to any installed theme.
    pub fn active_theme(&self, settings: &SiteSettings) -> CoreResult<Theme> {
        if let Some(theme) = self.theme(&settings.active_theme) {
            return Ok(theme);
        }
        if settings.active_theme != DEFAULT_THEME {
            log!("warn"; "theme `{}` not found, falling back", settings.active_theme);
        }
        if let Some(theme) = self.theme(DEFAULT_THEME) {
            return Ok(theme);
        }
        self.index
            .read()
            .first()
            .cloned()
            .ok_or_else(|| CoreError::not_found("no installed themes"))
    }

    /// Activate a theme: update settings, refresh the index.
    pub fn switch_theme(&self, name: &str, settings: &SettingsManager) -> CoreResult<()> {
        self.refresh();
        if self.theme(name).is_none() {
            return Err(CoreError::not_found(format!("theme `{name}`")));
        }

        let mut updated = (*settings.get()).clone();
        updated.active_theme = name.to_string();
        settings.update(updated)?;
        Ok(())
    }

    /// Remove an installed theme. The active theme cannot be deleted.
    pub fn delete_theme(&self, name: &str, settings: &SiteSettings) -> CoreResult<()> {
        if settings.active_theme == name {
            return Err(CoreError::Forbidden(format!(
                "cannot delete active theme `{name}`"
            )));
        }
        let theme = self
            .theme(name)
            .ok_or_else(|| CoreError::not_found(format!("theme `{name}`")))?;
        fs::remove_dir_all(&theme.root).map_err(|e| CoreError::Io(theme.root.clone(), e))?;
        self.refresh();
        Ok(())
    }
}

/// Read theme metadata; a missing or malformed file yields defaults.
fn read_theme_info(path: &Path) -> ThemeInfo {
    let Ok(content) = fs::read_to_string(path) else {
        return ThemeInfo::default();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        log!("warn"; "bad theme.json at {}: {e}", path.display());
        ThemeInfo::default()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn themes_fixture() -> (TempDir, ThemeManager) {
        let dir = tempdir().unwrap();
        for name in ["default", "dark"] {
            let root = dir.path().join(name);
            fs::create_dir_all(root.join("templates")).unwrap();
            fs::write(
                root.join("theme.json"),
                format!(r#"{{"title": "{name}", "version": "1.0.0"}}"#),
            )
            .unwrap();
        }
        let manager = ThemeManager::new(dir.path());
        (dir, manager)
    }

    #[test]
    fn test_discovery() {
        let (_dir, manager) = themes_fixture();
        let themes = manager.available_themes();
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].name, "dark");
        assert_eq!(themes[1].info.title, "default");
    }

    #[test]
    fn test_active_theme_from_settings() {
        let (_dir, manager) = themes_fixture();
        let mut settings = SiteSettings::default();
        settings.active_theme = "dark".into();
        assert_eq!(manager.active_theme(&settings).unwrap().name, "dark");
    }

    #[test]
    fn test_active_theme_falls_back_to_default() {
        let (_dir, manager) = themes_fixture();
        let mut settings = SiteSettings::default();
        settings.active_theme = "missing".into();
        assert_eq!(manager.active_theme(&settings).unwrap().name, "default");
    }

    #[test]
    fn test_switch_to_unknown_theme_fails() {
        let (dir, manager) = themes_fixture();
        let settings = SettingsManager::load(dir.path().join("settings.json")).unwrap();
        let err = manager.switch_theme("missing", &settings).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_switch_theme_updates_settings() {
        let (dir, manager) = themes_fixture();
        let settings = SettingsManager::load(dir.path().join("settings.json")).unwrap();
        manager.switch_theme("dark", &settings).unwrap();
        assert_eq!(settings.get().active_theme, "dark");
    }

    #[test]
    fn test_delete_active_theme_forbidden() {
        let (_dir, manager) = themes_fixture();
        let settings = SiteSettings::default();
        let err = manager.delete_theme("default", &settings).unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN_OPERATION");
    }

    #[test]
    fn test_delete_inactive_theme() {
        let (_dir, manager) = themes_fixture();
        let settings = SiteSettings::default();
        manager.delete_theme("dark", &settings).unwrap();
        assert!(manager.theme("dark").is_none());
    }

    #[test]
    fn test_template_paths() {
        let (_dir, manager) = themes_fixture();
        let theme = manager.theme("default").unwrap();
        assert!(theme.template_path("layout.html").ends_with("default/templates/layout.html"));
        assert!(
            theme
                .custom_template_path("custom", "homepage.html")
                .ends_with("default/custom/homepage.html")
        );
    }
}
