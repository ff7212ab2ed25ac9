//! Navigation menu persistence.
//!
//! The menu is an ordered tree stored in `menu.json` at the data root and
//! handed to every template render verbatim.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// One menu entry; `children` nests one level or more.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// Reads and writes the site menu file.
pub struct MenuStore {
    path: PathBuf,
}

impl MenuStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the menu. A missing file is an empty menu.
    pub fn load(&self) -> CoreResult<Vec<MenuItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| CoreError::Io(self.path.clone(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| CoreError::InvalidJson(self.path.clone(), e.to_string()))
    }

    /// Replace the menu, preserving the given order.
    pub fn save(&self, items: &[MenuItem]) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| CoreError::InvalidJson(self.path.clone(), e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| CoreError::Io(self.path.clone(), e))
    }

    /// Menu as template data.
    pub fn load_value(&self) -> serde_json::Value {
        self.load()
            .ok()
            .and_then(|items| serde_json::to_value(items).ok())
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new()))
    }
}
