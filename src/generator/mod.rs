//! Static site generation.
//!
//! Walks every known URL through the same render path the live server uses
//! and writes the result into the output tree. Pages are independent: a
//! failed render is logged and the run continues.

pub mod assets;

use crate::{
    content::{ContentKind, ContentStore, Document, QueryEngine},
    log,
    logger::Progress,
    render::{Renderer, data::term_slug, navigation, pagination::UrlMode},
    seo::{self, rss::FeedMode},
    settings::SiteSettings,
    theme::ThemeManager,
};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Custom slugs the generator never renders as pages; they are template
/// covers for the homepage and taxonomy listings.
const EXCLUDED_CUSTOM_SLUGS: &[&str] = &["homepage", "category", "tag"];

// ============================================================================
// Options
// ============================================================================

/// Effective build configuration after CLI overrides.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub output_dir: PathBuf,
    pub base_url: String,
    pub clean_urls: bool,
    pub minify: bool,
}

impl BuildOptions {
    pub fn from_settings(settings: &SiteSettings) -> Self {
        Self {
            output_dir: PathBuf::from(&settings.static_output_dir),
            base_url: settings.base_url().to_string(),
            clean_urls: settings.static_clean_urls,
            minify: settings.static_minify,
        }
    }
}

/// Per-run counters.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub pages_written: usize,
    pub pages_failed: usize,
    pub assets_copied: usize,
}

// ============================================================================
// Generator
// ============================================================================

pub struct StaticSiteGenerator<'a> {
    store: &'a ContentStore,
    themes: &'a ThemeManager,
    settings: SiteSettings,
    options: BuildOptions,
}

impl<'a> StaticSiteGenerator<'a> {
    pub fn new(
        store: &'a ContentStore,
        themes: &'a ThemeManager,
        settings: &SiteSettings,
        options: BuildOptions,
    ) -> Self {
        // SEO and pagination URLs must reflect the effective build options
        let mut settings = settings.clone();
        settings.site_url = options.base_url.clone();
        settings.static_clean_urls = options.clean_urls;
        Self {
            store,
            themes,
            settings,
            options,
        }
    }

    /// Generate the whole site.
    pub fn build(&self) -> Result<BuildSummary> {
        log!("generate"; "outputDir: {}", self.options.output_dir.display());
        log!("generate"; "baseUrl: {}", self.options.base_url);
        log!("generate"; "cleanUrls: {}", self.options.clean_urls);

        if self.options.output_dir.exists() {
            fs::remove_dir_all(&self.options.output_dir)
                .with_context(|| format!("clearing {}", self.options.output_dir.display()))?;
        }
        fs::create_dir_all(&self.options.output_dir)
            .with_context(|| format!("creating {}", self.options.output_dir.display()))?;

        let mut renderer = Renderer::new(self.store, self.themes, &self.settings, true)
            .context("preparing theme")?;
        renderer.precompute_navigation();

        let mut summary = BuildSummary::default();
        self.build_home(&renderer, &mut summary);
        self.build_posts(&renderer, &mut summary);
        self.build_pages(&renderer, &mut summary);
        self.build_taxonomy("category", &renderer, &mut summary);
        self.build_taxonomy("tag", &renderer, &mut summary);
        self.build_custom_pages(&renderer, &mut summary);
        self.build_seo(&renderer, &mut summary);
        self.write_page("404.html", renderer.render_not_found(), &mut summary);
        self.copy_assets(&renderer, &mut summary);

        log!("generate"; "done: {} pages, {} assets, {} failed",
            summary.pages_written, summary.assets_copied, summary.pages_failed);
        Ok(summary)
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn build_home(&self, renderer: &Renderer, summary: &mut BuildSummary) {
        let query = QueryEngine::new(self.store);
        let total = query.published_posts().len();
        let pages = total.div_ceil(self.settings.posts_per_page.max(1)).max(1);

        for page in 1..=pages {
            let rel = if page == 1 {
                "index.html".to_string()
            } else if self.options.clean_urls {
                format!("page/{page}/index.html")
            } else {
                format!("page-{page}.html")
            };
            match renderer.render_home(page, &self.home_url_mode()) {
                Ok(html) => self.write_page(&rel, html, summary),
                Err(e) => fail(summary, &rel, &e.to_string()),
            }
        }
    }

    fn build_posts(&self, renderer: &Renderer, summary: &mut BuildSummary) {
        let query = QueryEngine::new(self.store);
        let posts = query.published_posts();
        let mut progress = Progress::new("posts", posts.len());
        for post in &posts {
            let rel = self.leaf_path(&format!("post/{}", post.slug()));
            match renderer.render_post(post.slug()) {
                Ok(html) => self.write_page(&rel, html, summary),
                Err(e) => fail(summary, &rel, &e.to_string()),
            }
            progress.inc();
        }
    }

    fn build_pages(&self, renderer: &Renderer, summary: &mut BuildSummary) {
        let pages: Vec<Document> = self
            .store
            .list_lenient(ContentKind::Page)
            .into_iter()
            .filter(Document::is_published)
            // The `home` page backs the homepage, not /page/home
            .filter(|doc| doc.slug() != "home")
            .collect();
        for page in &pages {
            let rel = self.leaf_path(&format!("page/{}", page.slug()));
            match renderer.render_page(page.slug()) {
                Ok(html) => self.write_page(&rel, html, summary),
                Err(e) => fail(summary, &rel, &e.to_string()),
            }
        }
    }

    fn build_taxonomy(&self, taxonomy: &str, renderer: &Renderer, summary: &mut BuildSummary) {
        let query = QueryEngine::new(self.store);
        let terms = if taxonomy == "category" {
            query.all_categories()
        } else {
            query.all_tags()
        };

        for term in &terms {
            let slug = term_slug(term);
            let posts = if taxonomy == "category" {
                query.get_posts_by_category(term)
            } else {
                query.get_posts_by_tag(term)
            };
            let pages = posts
                .len()
                .div_ceil(self.settings.posts_per_page.max(1))
                .max(1);

            for page in 1..=pages {
                let base = format!("{taxonomy}/{slug}");
                let rel = if page == 1 {
                    self.leaf_path(&base)
                } else if self.options.clean_urls {
                    format!("{base}/page/{page}/index.html")
                } else {
                    format!("{base}/page-{page}.html")
                };
                match renderer.render_taxonomy(taxonomy, &slug, page, &self.list_url_mode(&base)) {
                    Ok(html) => self.write_page(&rel, html, summary),
                    Err(e) => fail(summary, &rel, &e.to_string()),
                }
            }
        }
    }

    fn build_custom_pages(&self, renderer: &Renderer, summary: &mut BuildSummary) {
        let pages: Vec<Document> = self
            .store
            .list_lenient(ContentKind::Custom)
            .into_iter()
            .filter(Document::is_published)
            .filter(|doc| !is_excluded_custom_slug(doc.slug()))
            .collect();

        let mut progress = Progress::new("custom pages", pages.len());
        for page in &pages {
            let path = navigation::custom_page_url_path(self.store, page);
            let rel = self.leaf_path(&path);
            match renderer.render_custom_page(page) {
                Ok(html) => self.write_page(&rel, html, summary),
                Err(e) => fail(summary, &rel, &e.to_string()),
            }
            progress.inc();
        }
    }

    fn build_seo(&self, renderer: &Renderer, summary: &mut BuildSummary) {
        let theme = renderer.theme();
        let structure = seo::analyze(self.store, theme);

        match seo::rss::generate_feed(self.store, &self.settings, &theme.name, FeedMode::Static) {
            Some(xml) => self.write_raw("rss.xml", xml.into_bytes(), summary),
            None => log!("generate"; "rss.xml skipped, no published posts"),
        }

        let sitemap = seo::sitemap::generate_sitemap_xml(self.store, &self.settings, theme, &structure);
        self.write_raw("sitemap.xml", sitemap.into_bytes(), summary);

        let html = seo::sitemap::generate_sitemap_html(self.store, &self.settings, theme, &structure);
        let rel = if self.options.clean_urls {
            "sitemap/index.html"
        } else {
            "sitemap.html"
        };
        self.write_page(rel, html, summary);

        let robots = seo::robots_txt(&self.settings, structure.has_posts);
        self.write_raw("robots.txt", robots.into_bytes(), summary);
    }

    fn copy_assets(&self, renderer: &Renderer, summary: &mut BuildSummary) {
        let theme = renderer.theme();
        let dest = self
            .options
            .output_dir
            .join("content/themes")
            .join(&theme.name)
            .join("assets");
        match assets::copy_tree(&theme.assets_dir, &dest) {
            Ok(count) => summary.assets_copied += count,
            Err(e) => log!("error"; "theme assets: {e:#}"),
        }

        let uploads = self.store.root().join("uploads");
        match assets::copy_tree(&uploads, &self.options.output_dir.join("content/uploads")) {
            Ok(count) => summary.assets_copied += count,
            Err(e) => log!("error"; "uploads: {e:#}"),
        }
    }

    // ========================================================================
    // Paths and writes
    // ========================================================================

    fn home_url_mode(&self) -> UrlMode {
        if self.options.clean_urls {
            UrlMode::static_clean("/")
        } else {
            UrlMode::static_ext("/")
        }
    }

    fn list_url_mode(&self, base: &str) -> UrlMode {
        if self.options.clean_urls {
            UrlMode::static_clean(format!("/{base}"))
        } else {
            UrlMode::static_ext(format!("/{base}.html"))
        }
    }

    /// Output path for a single (non-paginated) route.
    fn leaf_path(&self, route: &str) -> String {
        if self.options.clean_urls {
            format!("{route}/index.html")
        } else {
            format!("{route}.html")
        }
    }

    fn write_page(&self, rel: &str, html: String, summary: &mut BuildSummary) {
        let body = if self.options.minify {
            minify_html_page(html)
        } else {
            html.into_bytes()
        };
        self.write_raw(rel, body, summary);
    }

    fn write_raw(&self, rel: &str, body: Vec<u8>, summary: &mut BuildSummary) {
        let path = self.options.output_dir.join(rel);
        match write_file(&path, &body) {
            Ok(()) => {
                summary.pages_written += 1;
                log!("generate"; "{rel}");
            }
            Err(e) => fail(summary, rel, &format!("{e:#}")),
        }
    }
}

fn fail(summary: &mut BuildSummary, rel: &str, err: &str) {
    summary.pages_failed += 1;
    log!("error"; "{rel}: {err}");
}

fn write_file(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn is_excluded_custom_slug(slug: &str) -> bool {
    EXCLUDED_CUSTOM_SLUGS.contains(&slug)
        || slug.starts_with("category-")
        || slug.starts_with("tag-")
}

fn minify_html_page(html: String) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    minify_html::minify(html.as_bytes(), &cfg)
}

// ============================================================================
// Tests
// ============================================================================
