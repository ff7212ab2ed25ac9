//! Front-end route dispatch.
//!
//! Maps a request path to a rendered response. The same dispatcher backs the
//! live server; the static generator walks the known URL set directly.
//!
//! Custom-page chains claim up to three path segments, resolved left to
//! right: each segment must be a published custom page whose `parentPage` is
//! the previous segment's page. Reserved first segments are never consumed
//! by the chain.

use crate::{
    content::{ContentKind, ContentStore, Document},
    error::{CoreError, CoreResult},
    log,
    render::{Renderer, minimal_error_page, pagination::UrlMode},
    seo::{self, rss::FeedMode},
    settings::SiteSettings,
    theme::ThemeManager,
};

/// First path segments the custom-page chain must not consume.
const RESERVED_SEGMENTS: &[&str] = &[
    "api",
    "post",
    "page",
    "rss",
    "rss.xml",
    "sitemap",
    "sitemap.html",
    "sitemap.xml",
    "admin",
];

/// Longest custom-page chain the router resolves.
const MAX_CHAIN_DEPTH: usize = 3;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug)]
pub struct RouteResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl RouteResponse {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: body.into_bytes(),
        }
    }

    fn xml(content_type: &'static str, body: String) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into_bytes(),
        }
    }

    fn text(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; charset=utf-8",
            body: body.into_bytes(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub struct Router<'a> {
    store: &'a ContentStore,
    themes: &'a ThemeManager,
    settings: &'a SiteSettings,
}

impl<'a> Router<'a> {
    pub const fn new(
        store: &'a ContentStore,
        themes: &'a ThemeManager,
        settings: &'a SiteSettings,
    ) -> Self {
        Self {
            store,
            themes,
            settings,
        }
    }

    /// Dispatch a request path plus raw query string.
    pub fn dispatch(&self, path: &str, query: &str) -> RouteResponse {
        let renderer = match Renderer::new(self.store, self.themes, self.settings, false) {
            Ok(renderer) => renderer,
            Err(e) => {
                log!("error"; "render setup failed: {e}");
                return RouteResponse::html(500, minimal_error_page(500, "Something Went Wrong"));
            }
        };

        let page = page_param(query);
        match self.route(&renderer, path, page) {
            Ok(response) => response,
            Err(CoreError::NotFound(what)) => {
                log!("serve"; "404 {path} ({what})");
                RouteResponse::html(404, renderer.render_not_found())
            }
            Err(e) => {
                log!("error"; "500 {path}: {e}");
                RouteResponse::html(500, renderer.render_server_error())
            }
        }
    }

    fn route(
        &self,
        renderer: &Renderer,
        path: &str,
        page: usize,
    ) -> CoreResult<RouteResponse> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(RouteResponse::html(
                200,
                renderer.render_home(page, &UrlMode::Dynamic)?,
            )),
            ["post", slug] => Ok(RouteResponse::html(200, renderer.render_post(slug)?)),
            ["page", slug] => Ok(RouteResponse::html(200, renderer.render_page(slug)?)),
            [taxonomy @ ("category" | "tag"), slug] => Ok(RouteResponse::html(
                200,
                renderer.render_taxonomy(taxonomy, slug, page, &UrlMode::Dynamic)?,
            )),
            ["rss" | "rss.xml"] => self.feed(renderer),
            ["sitemap.xml"] => Ok(RouteResponse::xml(
                "application/xml; charset=utf-8",
                seo::sitemap::generate_sitemap_xml(
                    self.store,
                    self.settings,
                    renderer.theme(),
                    &seo::analyze(self.store, renderer.theme()),
                ),
            )),
            ["sitemap" | "sitemap.html"] => Ok(RouteResponse::html(
                200,
                seo::sitemap::generate_sitemap_html(
                    self.store,
                    self.settings,
                    renderer.theme(),
                    &seo::analyze(self.store, renderer.theme()),
                ),
            )),
            ["robots.txt"] => {
                let has_posts = seo::analyze(self.store, renderer.theme()).has_posts;
                Ok(RouteResponse::text(seo::robots_txt(self.settings, has_posts)))
            }
            chain if chain.len() <= MAX_CHAIN_DEPTH && !chain.is_empty() => {
                if RESERVED_SEGMENTS.contains(&chain[0]) {
                    return Err(CoreError::not_found(format!("route `{path}`")));
                }
                let doc = self.resolve_chain(chain)?;
                Ok(RouteResponse::html(200, renderer.render_custom_page(&doc)?))
            }
            _ => Err(CoreError::not_found(format!("route `{path}`"))),
        }
    }

    fn feed(&self, renderer: &Renderer) -> CoreResult<RouteResponse> {
        seo::rss::generate_feed(
            self.store,
            self.settings,
            &renderer.theme().name,
            FeedMode::Dynamic,
        )
        .map(|xml| RouteResponse::xml("application/rss+xml; charset=utf-8", xml))
        .ok_or_else(|| CoreError::not_found("feed (no published posts)"))
    }

    /// Resolve a custom-page chain left to right.
    ///
    /// Each segment matches either a bare slug or the parent-prefixed slug
    /// (`docs/intro` finds `docs-intro`); in both cases the page's
    /// `parentPage` must name the previous segment's page.
    fn resolve_chain(&self, segments: &[&str]) -> CoreResult<Document> {
        let mut current: Option<Document> = None;
        for segment in segments {
            let doc = match &current {
                None => self.lookup_custom(segment)?,
                Some(parent) => {
                    let prefixed = format!("{}-{segment}", parent.slug());
                    self.lookup_custom(&prefixed)
                        .or_else(|_| self.lookup_custom(segment))?
                }
            };

            let expected_parent = current.as_ref().map(|p| p.slug().to_string());
            if doc.parent_page().map(str::to_string) != expected_parent {
                return Err(CoreError::not_found(format!(
                    "custom page `{}`",
                    segments.join("/")
                )));
            }
            current = Some(doc);
        }
        current.ok_or_else(|| CoreError::not_found("empty route"))
    }

    fn lookup_custom(&self, slug: &str) -> CoreResult<Document> {
        let doc = self.store.get_by_slug(ContentKind::Custom, slug)?;
        if !doc.is_published() || !doc.is_custom_page() {
            return Err(CoreError::not_found(format!("custom page `{slug}`")));
        }
        Ok(doc)
    }
}

/// Extract `page=<n>` from a raw query string; absent or bad means page 1.
fn page_param(query: &str) -> usize {
    query
        .split('&')
        .filter_map(|pair| pair.strip_prefix("page="))
        .find_map(|value| value.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
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

    struct Site {
        _dir: TempDir,
        store: ContentStore,
        themes: ThemeManager,
        settings: SiteSettings,
    }

    impl Site {
        fn dispatch(&self, path: &str, query: &str) -> RouteResponse {
            Router::new(&self.store, &self.themes, &self.settings).dispatch(path, query)
        }
    }

    fn site() -> Site {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        let theme_root = dir.path().join("themes/default");
        fs::create_dir_all(theme_root.join("templates")).unwrap();
        fs::write(
            theme_root.join("templates/layout.html"),
            "{% if notFoundRoute %}missing{% else %}{{ metadata.title }}{% endif %}",
        )
        .unwrap();
        fs::write(theme_root.join("templates/home.html"), "home").unwrap();
        fs::write(theme_root.join("templates/post.html"), "post {{ metadata.slug }}").unwrap();
        fs::write(theme_root.join("templates/page.html"), "page {{ metadata.slug }}").unwrap();
        fs::write(theme_root.join("templates/custom.html"), "custom {{ metadata.slug }}").unwrap();
        let themes = ThemeManager::new(dir.path().join("themes"));
        let mut settings = SiteSettings::default();
        settings.site_url = "https://example.com".into();
        Site {
            _dir: dir,
            store,
            themes,
            settings,
        }
    }

    fn doc(id: &str, slug: &str, extra: &[(&str, &str)]) -> Document {
        let mut meta = Map::new();
        meta.insert("id".into(), id.into());
        meta.insert("slug".into(), slug.into());
        meta.insert("title".into(), format!("T {id}").into());
        meta.insert("status".into(), "published".into());
        meta.insert("createdAt".into(), "2024-01-01".into());
        for (k, v) in extra {
            meta.insert((*k).into(), (*v).into());
        }
        Document {
            metadata: meta,
            body: "body".into(),
        }
    }

    #[test]
    fn test_home_and_post_routes() {
        let site = site();
        site.store
            .create(ContentKind::Post, doc("p1", "hello", &[]))
            .unwrap();

        let home = site.dispatch("/", "");
        assert_eq!(home.status, 200);
        assert_eq!(home.body, b"home");

        let post = site.dispatch("/post/hello", "");
        assert_eq!(post.status, 200);
        assert_eq!(post.body, b"post hello");

        let missing = site.dispatch("/post/nope", "");
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body, b"missing");
    }

    #[test]
    fn test_custom_chain_routes() {
        let site = site();
        site.store
            .create(ContentKind::Custom, doc("c1", "docs", &[("pageType", "custom")]))
            .unwrap();
        site.store
            .create(
                ContentKind::Custom,
                doc("c2", "docs-intro", &[("pageType", "custom"), ("parentPage", "docs")]),
            )
            .unwrap();

        assert_eq!(site.dispatch("/docs", "").status, 200);
        let nested = site.dispatch("/docs/intro", "");
        assert_eq!(nested.status, 200);
        assert_eq!(nested.body, b"custom docs-intro");

        // Wrong parent relationship is a 404
        assert_eq!(site.dispatch("/intro/docs", "").status, 404);
        // A nested page is not reachable at top level
        assert_eq!(site.dispatch("/docs-intro", "").status, 404);
    }

    #[test]
    fn test_reserved_segments_not_consumed() {
        let site = site();
        site.store
            .create(ContentKind::Custom, doc("c1", "admin", &[("pageType", "custom")]))
            .unwrap();
        assert_eq!(site.dispatch("/admin", "").status, 404);
        assert_eq!(site.dispatch("/api/posts", "").status, 404);
    }

    #[test]
    fn test_draft_custom_page_hidden() {
        let site = site();
        site.store
            .create(
                ContentKind::Custom,
                doc("c1", "secret", &[("pageType", "custom"), ("status", "draft")]),
            )
            .unwrap();
        assert_eq!(site.dispatch("/secret", "").status, 404);
    }

    #[test]
    fn test_seo_routes() {
        let site = site();
        assert_eq!(site.dispatch("/rss.xml", "").status, 404);

        site.store
            .create(ContentKind::Post, doc("p1", "hello", &[]))
            .unwrap();
        let feed = site.dispatch("/rss.xml", "");
        assert_eq!(feed.status, 200);
        assert!(feed.content_type.starts_with("application/rss+xml"));

        let sitemap = site.dispatch("/sitemap.xml", "");
        assert_eq!(sitemap.status, 200);
        assert!(String::from_utf8(sitemap.body).unwrap().contains("<urlset"));

        let robots = site.dispatch("/robots.txt", "");
        assert!(String::from_utf8(robots.body).unwrap().contains("User-agent: *"));

        let html = site.dispatch("/sitemap", "");
        assert!(String::from_utf8(html.body).unwrap().contains("<h1>Sitemap</h1>"));
    }

    #[test]
    fn test_page_param() {
        assert_eq!(page_param(""), 1);
        assert_eq!(page_param("page=3"), 3);
        assert_eq!(page_param("x=1&page=2"), 2);
        assert_eq!(page_param("page=abc"), 1);
        assert_eq!(page_param("page=0"), 1);
    }
}
