//! Template engine wrapper.
//!
//! Loads every `.html` file under the active theme into a Tera environment,
//! addressed by path relative to the theme root (`templates/layout.html`,
//! `custom/homepage.html`). Templates extend and include each other through
//! those same names.

use crate::{
    error::{CoreError, CoreResult},
    theme::Theme,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// One theme's compiled template set.
pub struct TemplateEngine {
    theme_root: PathBuf,
    tera: Tera,
}

impl TemplateEngine {
    /// Compile all templates of a theme.
    pub fn for_theme(theme: &Theme) -> CoreResult<Self> {
        let glob = format!("{}/**/*.html", theme.root.display());
        let mut tera =
            Tera::new(&glob).map_err(|e| CoreError::Template(e.to_string()))?;
        tera.autoescape_on(vec![]);
        Ok(Self {
            theme_root: theme.root.clone(),
            tera,
        })
    }

    /// Render a resolved template file with the assembled data.
    pub fn render(&self, template_path: &Path, data: &Value) -> CoreResult<String> {
        let name = self.template_name(template_path)?;
        let context = Context::from_value(data.clone())
            .map_err(|e| CoreError::Template(e.to_string()))?;
        self.tera
            .render(&name, &context)
            .map_err(|e| CoreError::Template(render_error_chain(&e)))
    }

    fn template_name(&self, template_path: &Path) -> CoreResult<String> {
        let relative = template_path.strip_prefix(&self.theme_root).map_err(|_| {
            CoreError::Template(format!(
                "template `{}` is outside the active theme",
                template_path.display()
            ))
        })?;
        Ok(relative.to_string_lossy().replace('\\', "/"))
    }
}

/// Tera nests the useful message in error sources; flatten the chain.
fn render_error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
