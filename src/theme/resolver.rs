//! Template lookup.
//!
//! Given a render request, walk an ordered fallback chain through the active
//! theme and return the first template file that exists. The chain ends at
//! `templates/layout.html`, which every theme is expected to ship.

use super::Theme;
use std::path::{Path, PathBuf};

// ============================================================================
// Types
// ============================================================================

/// What is being rendered, for template lookup purposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRequest<'a> {
    pub content_type: &'a str,
    pub slug: Option<&'a str>,
    pub is_custom_page: bool,
    pub is_taxonomy: bool,
}

impl<'a> TemplateRequest<'a> {
    pub fn new(content_type: &'a str) -> Self {
        Self {
            content_type,
            ..Default::default()
        }
    }

    pub fn custom_page(slug: &'a str) -> Self {
        Self {
            content_type: "custom",
            slug: Some(slug),
            is_custom_page: true,
            is_taxonomy: false,
        }
    }

    pub fn taxonomy(content_type: &'a str, term: &'a str) -> Self {
        Self {
            content_type,
            slug: Some(term),
            is_custom_page: false,
            is_taxonomy: true,
        }
    }
}

/// Result of [`check_custom_template`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomTemplateCheck {
    pub is_custom_template: bool,
    pub template_slug: Option<String>,
}

// ============================================================================
// Resolution
// ============================================================================

/// Walk the fallback chain and return the first existing template file.
pub fn resolve_template_path(theme: &Theme, request: &TemplateRequest) -> PathBuf {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if request.content_type == "home" {
        candidates.push(theme.custom_dir.join("homepage.html"));
    }

    if request.is_custom_page && let Some(slug) = request.slug {
        candidates.push(theme.custom_dir.join(format!("{slug}.html")));
        // Nested pages encode their chain in the slug; shrink from the right.
        let segments: Vec<&str> = slug.split('-').collect();
        if segments.len() > 1 {
            let parent = segments[..segments.len() - 1].join("-");
            candidates.push(theme.custom_dir.join(format!("{parent}.html")));
        }
        if segments.len() > 2 {
            candidates.push(theme.custom_dir.join(format!("{}.html", segments[0])));
        }
    }

    if request.is_taxonomy && let Some(term) = request.slug {
        let kind = request.content_type;
        candidates.push(theme.custom_dir.join(format!("{kind}-{term}.html")));
        candidates.push(theme.custom_dir.join(format!("{kind}.html")));
        candidates.push(theme.templates_dir.join("taxonomy.html"));
    }

    candidates.push(
        theme
            .templates_dir
            .join(format!("{}.html", request.content_type)),
    );
    candidates.push(theme.templates_dir.join("content.html"));

    for candidate in candidates {
        if candidate.is_file() {
            return candidate;
        }
    }
    theme.templates_dir.join("layout.html")
}

/// Whether a resolved path points into a theme's `custom/` directory,
/// and if so under which name.
pub fn check_custom_template(path: &Path) -> CustomTemplateCheck {
    let is_html = path.extension().is_some_and(|ext| ext == "html");
    let in_custom_dir = path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|dir| dir == "custom");
    let under_themes = path
        .ancestors()
        .nth(3)
        .and_then(Path::file_name)
        .is_some_and(|dir| dir == "themes");

    if is_html && in_custom_dir && under_themes {
        CustomTemplateCheck {
            is_custom_template: true,
            template_slug: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
        }
    } else {
        CustomTemplateCheck::default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn theme_with(files: &[&str]) -> (TempDir, Theme) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("themes").join("default");
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::create_dir_all(root.join("custom")).unwrap();
        fs::write(root.join("templates").join("layout.html"), "layout").unwrap();
        for file in files {
            fs::write(root.join(file), "x").unwrap();
        }
        let theme = Theme::from_dir(root);
        (dir, theme)
    }

    #[test]
    fn test_homepage_prefers_custom_override() {
        let (_dir, theme) = theme_with(&["custom/homepage.html", "templates/home.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::new("home"));
        assert!(path.ends_with("custom/homepage.html"));
    }

    #[test]
    fn test_homepage_falls_back_to_template() {
        let (_dir, theme) = theme_with(&["templates/home.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::new("home"));
        assert!(path.ends_with("templates/home.html"));
    }

    #[test]
    fn test_custom_page_exact_slug() {
        let (_dir, theme) = theme_with(&["custom/docs-intro.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::custom_page("docs-intro"));
        assert!(path.ends_with("custom/docs-intro.html"));
    }

    #[test]
    fn test_custom_page_shrinks_to_parent() {
        let (_dir, theme) = theme_with(&["custom/docs-intro.html"]);
        let request = TemplateRequest::custom_page("docs-intro-install");
        let path = resolve_template_path(&theme, &request);
        assert!(path.ends_with("custom/docs-intro.html"));
    }

    #[test]
    fn test_custom_page_shrinks_to_first_segment() {
        let (_dir, theme) = theme_with(&["custom/docs.html"]);
        let request = TemplateRequest::custom_page("docs-intro-install");
        let path = resolve_template_path(&theme, &request);
        assert!(path.ends_with("custom/docs.html"));
    }

    #[test]
    fn test_two_segment_slug_does_not_try_first_segment() {
        let (_dir, theme) = theme_with(&["custom/docs.html", "templates/custom.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::custom_page("guide-intro"));
        assert!(path.ends_with("custom/guide.html") == false);
        assert!(path.ends_with("templates/custom.html"));
    }

    #[test]
    fn test_custom_page_without_custom_dir_match_uses_custom_template() {
        let (_dir, theme) = theme_with(&["templates/custom.html", "templates/content.html"]);
        let request = TemplateRequest::custom_page("docs-intro-install");
        let path = resolve_template_path(&theme, &request);
        assert!(path.ends_with("templates/custom.html"));
    }

    #[test]
    fn test_taxonomy_chain() {
        let (_dir, theme) = theme_with(&["custom/category-rust.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::taxonomy("category", "rust"));
        assert!(path.ends_with("custom/category-rust.html"));

        let (_dir, theme) = theme_with(&["custom/category.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::taxonomy("category", "rust"));
        assert!(path.ends_with("custom/category.html"));

        let (_dir, theme) = theme_with(&["templates/taxonomy.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::taxonomy("category", "rust"));
        assert!(path.ends_with("templates/taxonomy.html"));
    }

    #[test]
    fn test_content_type_then_content_then_layout() {
        let (_dir, theme) = theme_with(&["templates/post.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::new("post"));
        assert!(path.ends_with("templates/post.html"));

        let (_dir, theme) = theme_with(&["templates/content.html"]);
        let path = resolve_template_path(&theme, &TemplateRequest::new("post"));
        assert!(path.ends_with("templates/content.html"));

        let (_dir, theme) = theme_with(&[]);
        let path = resolve_template_path(&theme, &TemplateRequest::new("post"));
        assert!(path.ends_with("templates/layout.html"));
    }

    #[test]
    fn test_check_custom_template() {
        let check =
            check_custom_template(Path::new("/data/themes/default/custom/homepage.html"));
        assert!(check.is_custom_template);
        assert_eq!(check.template_slug.as_deref(), Some("homepage"));

        let check =
            check_custom_template(Path::new("/data/themes/default/templates/layout.html"));
        assert!(!check.is_custom_template);
        assert_eq!(check.template_slug, None);
    }
}
