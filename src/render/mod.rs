//! Rendering pipeline.
//!
//! Route parameters in, HTML out: look up content, resolve the template,
//! assemble data, filter it, render. The same path backs the live server and
//! the static generator; the only differences are the pagination URL shape
//! and the `isGenerateStatic` flag.

pub mod data;
pub mod engine;
pub mod markdown;
pub mod navigation;
pub mod pagination;

use crate::{
    content::{ContentKind, ContentStore, Document, GetOptions, QueryEngine},
    error::{CoreError, CoreResult},
    log,
    settings::SiteSettings,
    theme::{
        Theme, ThemeManager,
        menu::MenuStore,
        resolver::{TemplateRequest, resolve_template_path},
    },
};
use data::DataAssembler;
use engine::TemplateEngine;
use pagination::{Pagination, UrlMode};

// ============================================================================
// Renderer
// ============================================================================

/// One theme-bound render session over a content store.
pub struct Renderer<'a> {
    store: &'a ContentStore,
    settings: &'a SiteSettings,
    theme: Theme,
    engine: TemplateEngine,
    menu: MenuStore,
    is_static: bool,
    sibling_index: Option<navigation::SiblingIndex>,
}

impl<'a> Renderer<'a> {
    /// Resolve the active theme and compile its templates.
    pub fn new(
        store: &'a ContentStore,
        themes: &ThemeManager,
        settings: &'a SiteSettings,
        is_static: bool,
    ) -> CoreResult<Self> {
        let theme = themes.active_theme(settings)?;
        let engine = TemplateEngine::for_theme(&theme)?;
        let menu = MenuStore::new(store.root().join("menu.json"));
        Ok(Self {
            store,
            settings,
            theme,
            engine,
            menu,
            is_static,
            sibling_index: None,
        })
    }

    /// Build sibling navigation for the whole custom-page set once, so bulk
    /// renders (the static generator) do not rescan per page.
    pub fn precompute_navigation(&mut self) {
        self.sibling_index = Some(navigation::SiblingIndex::build(self.store));
    }

    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    fn assembler(&self) -> DataAssembler<'_> {
        let assembler =
            DataAssembler::new(self.store, self.settings, &self.theme, &self.menu, self.is_static);
        match &self.sibling_index {
            Some(index) => assembler.with_sibling_index(index),
            None => assembler,
        }
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// The homepage at `page`, paginated over published posts.
    pub fn render_home(&self, page: usize, mode: &UrlMode) -> CoreResult<String> {
        let query = QueryEngine::new(self.store);
        let posts = query.published_posts();
        let pagination =
            Pagination::build(posts.len(), self.settings.posts_per_page, page, mode);
        let window = pagination.window(&posts);

        let template = resolve_template_path(&self.theme, &TemplateRequest::new("home"));
        let data = self
            .assembler()
            .assemble_home(window, &pagination, pagination.current_page, &template);
        self.engine.render(&template, &data)
    }

    /// A single published post with neighbors and related posts resolved.
    pub fn render_post(&self, slug: &str) -> CoreResult<String> {
        let doc = self.store.get_by_slug(ContentKind::Post, slug)?;
        if !doc.is_published() {
            return Err(CoreError::not_found(format!("post `{slug}`")));
        }
        let query = QueryEngine::new(self.store);
        let doc = query.get_post(
            doc.id(),
            &GetOptions {
                resolve_related_posts: true,
                add_navigation: true,
            },
        )?;

        let template = resolve_template_path(&self.theme, &TemplateRequest::new("post"));
        let data = self.assembler().assemble_post(&doc, &template);
        self.engine.render(&template, &data)
    }

    /// A published normal page by slug.
    pub fn render_page(&self, slug: &str) -> CoreResult<String> {
        let doc = self.store.get_by_slug(ContentKind::Page, slug)?;
        if !doc.is_published() {
            return Err(CoreError::not_found(format!("page `{slug}`")));
        }
        let template = resolve_template_path(&self.theme, &TemplateRequest::new("page"));
        let data = self.assembler().assemble_page(&doc, &template);
        self.engine.render(&template, &data)
    }

    /// A published custom page, already resolved from its route chain.
    pub fn render_custom_page(&self, doc: &Document) -> CoreResult<String> {
        let template =
            resolve_template_path(&self.theme, &TemplateRequest::custom_page(doc.slug()));
        let data = self.assembler().assemble_page(doc, &template);
        self.engine.render(&template, &data)
    }

    /// A category or tag listing at `page`.
    pub fn render_taxonomy(
        &self,
        taxonomy: &str,
        term_slug: &str,
        page: usize,
        mode: &UrlMode,
    ) -> CoreResult<String> {
        let query = QueryEngine::new(self.store);
        let term = query
            .canonical_term(taxonomy, term_slug)
            .ok_or_else(|| CoreError::not_found(format!("{taxonomy} `{term_slug}`")))?;

        let posts = if taxonomy == "category" {
            query.get_posts_by_category(&term)
        } else {
            query.get_posts_by_tag(&term)
        };
        let pagination =
            Pagination::build(posts.len(), self.settings.posts_per_page, page, mode);
        let window = pagination.window(&posts);

        let template =
            resolve_template_path(&self.theme, &TemplateRequest::taxonomy(taxonomy, &term));
        let data = self.assembler().assemble_taxonomy(
            taxonomy,
            &term,
            window,
            &pagination,
            pagination.current_page,
            &template,
        );
        self.engine.render(&template, &data)
    }

    // ========================================================================
    // Error pages
    // ========================================================================

    /// The themed 404, or a minimal fallback if the theme cannot render.
    pub fn render_not_found(&self) -> String {
        let template = self.theme.template_path("layout.html");
        let data = self.assembler().assemble_not_found(&template);
        self.engine.render(&template, &data).unwrap_or_else(|e| {
            log!("error"; "404 render failed: {e}");
            minimal_error_page(404, "Page Not Found")
        })
    }

    /// The themed 500, or a minimal fallback.
    pub fn render_server_error(&self) -> String {
        let template = self.theme.template_path("layout.html");
        let data = self.assembler().assemble_server_error(&template);
        self.engine.render(&template, &data).unwrap_or_else(|e| {
            log!("error"; "500 render failed: {e}");
            minimal_error_page(500, "Something Went Wrong")
        })
    }
}

/// Last-resort error body when the theme itself fails.
pub fn minimal_error_page(status: u16, message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{status}</title></head>\
         <body><h1>{status}</h1><p>{message}</p></body></html>"
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn site_fixture() -> (TempDir, ContentStore, ThemeManager, SiteSettings) {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());

        let theme_root = dir.path().join("themes/default");
        fs::create_dir_all(theme_root.join("templates")).unwrap();
        fs::write(
            theme_root.join("templates/layout.html"),
            "{% if notFoundRoute %}404!{% else %}layout: {{ metadata.title }}{% endif %}",
        )
        .unwrap();
        fs::write(
            theme_root.join("templates/home.html"),
            "home p{{ pagination.currentPage }}:{% for post in posts %}[{{ post.title }}]{% endfor %}",
        )
        .unwrap();
        fs::write(
            theme_root.join("templates/post.html"),
            "post: {{ metadata.title }} {{ content }}",
        )
        .unwrap();
        fs::write(
            theme_root.join("templates/taxonomy.html"),
            "{{ metadata.title }} ({{ pagination.totalItems }})",
        )
        .unwrap();

        let themes = ThemeManager::new(dir.path().join("themes"));
        (dir, store, themes, SiteSettings::default())
    }

    fn post(id: &str, slug: &str, date: &str, status: &str) -> Document {
        let mut meta = Map::new();
        meta.insert("id".into(), id.into());
        meta.insert("slug".into(), slug.into());
        meta.insert("title".into(), format!("Post {id}").into());
        meta.insert("status".into(), status.into());
        meta.insert("createdAt".into(), date.into());
        meta.insert("category".into(), "Tech".into());
        Document {
            metadata: meta,
            body: format!("Body of {id}"),
        }
    }

    #[test]
    fn test_render_home_lists_published_newest_first() {
        let (_dir, store, themes, settings) = site_fixture();
        store.create(ContentKind::Post, post("p1", "one", "2024-01-01", "published")).unwrap();
        store.create(ContentKind::Post, post("p2", "two", "2024-02-01", "published")).unwrap();
        store.create(ContentKind::Post, post("p3", "draft", "2024-03-01", "draft")).unwrap();

        let renderer = Renderer::new(&store, &themes, &settings, false).unwrap();
        let html = renderer.render_home(1, &UrlMode::Dynamic).unwrap();
        assert_eq!(html, "home p1:[Post p2][Post p1]");
    }

    #[test]
    fn test_render_post() {
        let (_dir, store, themes, settings) = site_fixture();
        store.create(ContentKind::Post, post("p1", "one", "2024-01-01", "published")).unwrap();

        let renderer = Renderer::new(&store, &themes, &settings, false).unwrap();
        let html = renderer.render_post("one").unwrap();
        assert!(html.starts_with("post: Post p1"));
        assert!(html.contains("Body of p1"));
    }

    #[test]
    fn test_draft_post_is_not_found() {
        let (_dir, store, themes, settings) = site_fixture();
        store.create(ContentKind::Post, post("p1", "one", "2024-01-01", "draft")).unwrap();

        let renderer = Renderer::new(&store, &themes, &settings, false).unwrap();
        let err = renderer.render_post("one").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_render_taxonomy_by_slug() {
        let (_dir, store, themes, settings) = site_fixture();
        store.create(ContentKind::Post, post("p1", "one", "2024-01-01", "published")).unwrap();
        store.create(ContentKind::Post, post("p2", "two", "2024-02-01", "published")).unwrap();

        let renderer = Renderer::new(&store, &themes, &settings, false).unwrap();
        let html = renderer
            .render_taxonomy("category", "tech", 1, &UrlMode::Dynamic)
            .unwrap();
        assert_eq!(html, "Category: Tech (2)");
    }

    #[test]
    fn test_unknown_term_is_not_found() {
        let (_dir, store, themes, settings) = site_fixture();
        let renderer = Renderer::new(&store, &themes, &settings, false).unwrap();
        let err = renderer
            .render_taxonomy("tag", "missing", 1, &UrlMode::Dynamic)
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_not_found_page_uses_layout() {
        let (_dir, store, themes, settings) = site_fixture();
        let renderer = Renderer::new(&store, &themes, &settings, false).unwrap();
        assert_eq!(renderer.render_not_found(), "404!");
    }

    #[test]
    fn test_minimal_error_page() {
        let html = minimal_error_page(500, "Something Went Wrong");
        assert!(html.contains("<h1>500</h1>"));
    }
}
