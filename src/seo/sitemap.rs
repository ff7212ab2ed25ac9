//! Sitemap generation, XML and HTML.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!     <changefreq>daily</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```
//!
//! The HTML sitemap mirrors the XML one as a readable page grouped into
//! sections, with section links emitted only when the matching index page or
//! template exists.

use super::{SiteStructure, chain_has_template};
use crate::{
    content::{ContentKind, ContentStore, Document, QueryEngine},
    log,
    render::data::term_slug,
    settings::SiteSettings,
    theme::Theme,
};
use chrono::Utc;

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Types
// ============================================================================

/// Single URL entry in the sitemap
struct UrlEntry {
    loc: String,
    lastmod: Option<String>,
    changefreq: &'static str,
    priority: &'static str,
}

/// All published site URLs grouped by kind, shared by both sitemap flavors.
struct SiteUrls {
    posts: Vec<Document>,
    pages: Vec<Document>,
    custom: Vec<Document>,
    categories: Vec<String>,
    tags: Vec<String>,
}

fn collect(store: &ContentStore, theme: &Theme) -> SiteUrls {
    let query = QueryEngine::new(store);
    let custom = store
        .list_lenient(ContentKind::Custom)
        .into_iter()
        .filter(Document::is_published)
        .filter(|doc| {
            if chain_has_template(theme, doc) {
                true
            } else {
                log!("warn"; "sitemap: skipping `{}`, no template in chain", doc.slug());
                false
            }
        })
        .collect();

    SiteUrls {
        posts: query.published_posts(),
        // The `home` page backs the homepage; it is never addressed as /page/home.
        pages: store
            .list_lenient(ContentKind::Page)
            .into_iter()
            .filter(Document::is_published)
            .filter(|doc| doc.slug() != "home")
            .collect(),
        custom,
        categories: query.all_categories(),
        tags: query.all_tags(),
    }
}

fn lastmod(doc: &Document) -> Option<String> {
    doc.updated_at()
        .or_else(|| doc.created_at())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn custom_page_path(store: &ContentStore, doc: &Document) -> String {
    crate::render::navigation::custom_page_url_path(store, doc)
}

// ============================================================================
// XML sitemap
// ============================================================================

/// Generate `sitemap.xml` over every published, reachable URL.
pub fn generate_sitemap_xml(
    store: &ContentStore,
    settings: &SiteSettings,
    theme: &Theme,
    structure: &SiteStructure,
) -> String {
    let base = settings.base_url();
    let urls = collect(store, theme);
    let mut entries: Vec<UrlEntry> = Vec::new();

    entries.push(UrlEntry {
        loc: format!("{base}/"),
        lastmod: None,
        changefreq: "daily",
        priority: "1.0",
    });
    if structure.has_posts {
        entries.push(UrlEntry {
            loc: format!("{base}/rss.xml"),
            lastmod: None,
            changefreq: "weekly",
            priority: "0.4",
        });
    }
    for post in &urls.posts {
        entries.push(UrlEntry {
            loc: format!("{base}/post/{}", post.slug()),
            lastmod: lastmod(post),
            changefreq: "weekly",
            priority: "0.8",
        });
    }
    for page in &urls.pages {
        entries.push(UrlEntry {
            loc: format!("{base}/page/{}", page.slug()),
            lastmod: lastmod(page),
            changefreq: "monthly",
            priority: "0.7",
        });
    }
    for page in &urls.custom {
        entries.push(UrlEntry {
            loc: format!("{base}/{}", custom_page_path(store, page)),
            lastmod: lastmod(page),
            changefreq: "monthly",
            priority: "0.6",
        });
    }
    for term in &urls.categories {
        entries.push(UrlEntry {
            loc: format!("{base}/category/{}", term_slug(term)),
            lastmod: None,
            changefreq: "weekly",
            priority: "0.6",
        });
    }
    for term in &urls.tags {
        entries.push(UrlEntry {
            loc: format!("{base}/tag/{}", term_slug(term)),
            lastmod: None,
            changefreq: "weekly",
            priority: "0.5",
        });
    }

    into_xml(entries)
}

/// Generate sitemap XML string.
fn into_xml(entries: Vec<UrlEntry>) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq
        ));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

// ============================================================================
// HTML sitemap
// ============================================================================

/// Generate the human-readable sitemap page.
pub fn generate_sitemap_html(
    store: &ContentStore,
    settings: &SiteSettings,
    theme: &Theme,
    structure: &SiteStructure,
) -> String {
    let urls = collect(store, theme);
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str(&format!(
        "<title>Sitemap - {}</title>\n",
        escape_xml(&settings.site_title)
    ));
    html.push_str("<meta charset=\"utf-8\">\n</head>\n<body>\n<h1>Sitemap</h1>\n");

    section(&mut html, "Home", &[("Home".to_string(), "/".to_string())]);

    if structure.has_posts {
        let mut links: Vec<(String, String)> = Vec::new();
        if let Some(slug) = &structure.blog_index_page {
            links.push(("Blog".to_string(), format!("/{slug}")));
        }
        links.extend(
            urls.posts
                .iter()
                .map(|post| (post.title().to_string(), format!("/post/{}", post.slug()))),
        );
        section(&mut html, "Blog Posts", &links);
    }
    if !urls.pages.is_empty() {
        let links: Vec<(String, String)> = urls
            .pages
            .iter()
            .map(|page| (page.title().to_string(), format!("/page/{}", page.slug())))
            .collect();
        section(&mut html, "Pages", &links);
    }
    if structure.has_categories
        && (structure.has_categories_template || structure.categories_index_page.is_some())
    {
        let mut links: Vec<(String, String)> = Vec::new();
        if let Some(slug) = &structure.categories_index_page {
            links.push(("Categories".to_string(), format!("/{slug}")));
        }
        links.extend(
            urls.categories
                .iter()
                .map(|term| (term.clone(), format!("/category/{}", term_slug(term)))),
        );
        section(&mut html, "Categories", &links);
    }
    if structure.has_tags && (structure.has_tags_template || structure.tags_index_page.is_some()) {
        let mut links: Vec<(String, String)> = Vec::new();
        if let Some(slug) = &structure.tags_index_page {
            links.push(("Tags".to_string(), format!("/{slug}")));
        }
        links.extend(
            urls.tags
                .iter()
                .map(|term| (term.clone(), format!("/tag/{}", term_slug(term)))),
        );
        section(&mut html, "Tags", &links);
    }
    if !urls.custom.is_empty() {
        let links: Vec<(String, String)> = urls
            .custom
            .iter()
            .map(|page| {
                (
                    page.title().to_string(),
                    format!("/{}", custom_page_path(store, page)),
                )
            })
            .collect();
        section(&mut html, "Other", &links);
    }

    html.push_str(&format!(
        "<footer><p>Generated at {}</p></footer>\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    ));
    html.push_str("</body>\n</html>\n");
    html
}

fn section(html: &mut String, heading: &str, links: &[(String, String)]) {
    if links.is_empty() {
        return;
    }
    html.push_str(&format!("<section>\n<h2>{heading}</h2>\n<ul>\n"));
    for (title, href) in links {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_xml(href),
            escape_xml(title)
        ));
    }
    html.push_str("</ul>\n</section>\n");
}

// ============================================================================
// Helpers
// ============================================================================

/// Escape special characters for XML output.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seo::analyze;
    use serde_json::Map;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn doc(id: &str, slug: &str, extra: &[(&str, &str)]) -> Document {
        let mut meta = Map::new();
        meta.insert("id".into(), id.into());
        meta.insert("slug".into(), slug.into());
        meta.insert("title".into(), format!("T {id}").into());
        meta.insert("status".into(), "published".into());
        meta.insert("createdAt".into(), "2024-05-10T08:00:00Z".into());
        for (k, v) in extra {
            meta.insert((*k).into(), (*v).into());
        }
        Document {
            metadata: meta,
            body: "body".into(),
        }
    }

    fn site() -> (TempDir, ContentStore, SiteSettings, Theme) {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        let theme_root = dir.path().join("themes/default");
        fs::create_dir_all(theme_root.join("templates")).unwrap();
        fs::create_dir_all(theme_root.join("custom")).unwrap();
        fs::write(theme_root.join("templates/layout.html"), "x").unwrap();
        fs::write(theme_root.join("templates/taxonomy.html"), "x").unwrap();
        let mut settings = SiteSettings::default();
        settings.site_url = "https://example.com".into();
        (dir, store, settings, Theme::from_dir(theme_root))
    }

    #[test]
    fn test_priorities_and_changefreq() {
        let (_dir, store, settings, theme) = site();
        store
            .create(ContentKind::Post, doc("p1", "hello", &[("category", "Tech")]))
            .unwrap();
        store.create(ContentKind::Page, doc("g1", "about", &[])).unwrap();

        let structure = analyze(&store, &theme);
        let xml = generate_sitemap_xml(&store, &settings, &theme, &structure);

        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<loc>https://example.com/post/hello</loc>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert!(xml.contains("<loc>https://example.com/page/about</loc>"));
        assert!(xml.contains("<priority>0.7</priority>"));
        assert!(xml.contains("<loc>https://example.com/category/tech</loc>"));
        assert!(xml.contains("<loc>https://example.com/rss.xml</loc>"));
        assert!(xml.contains("<priority>0.4</priority>"));
        assert!(xml.contains("<lastmod>2024-05-10</lastmod>"));
        assert!(xml.contains("<changefreq>daily</changefreq>"));
    }

    #[test]
    fn test_empty_site_lists_only_home() {
        let (_dir, store, settings, theme) = site();
        store.create(ContentKind::Page, doc("g1", "home", &[])).unwrap();

        let structure = analyze(&store, &theme);
        let xml = generate_sitemap_xml(&store, &settings, &theme, &structure);

        let locs: Vec<&str> = xml
            .lines()
            .filter(|line| line.contains("<loc>"))
            .map(str::trim)
            .collect();
        assert_eq!(locs, vec!["<loc>https://example.com/</loc>"]);
    }

    #[test]
    fn test_index_pages_gate_html_sections() {
        let (_dir, store, settings, theme) = site();
        fs::remove_file(theme.templates_dir.join("taxonomy.html")).unwrap();
        store
            .create(
                ContentKind::Post,
                doc("p1", "hello", &[("category", "Tech"), ("tags", "rust")]),
            )
            .unwrap();
        store
            .create(ContentKind::Custom, doc("c1", "category", &[("pageType", "custom")]))
            .unwrap();

        let structure = analyze(&store, &theme);
        assert_eq!(structure.categories_index_page.as_deref(), Some("category"));

        let html = generate_sitemap_html(&store, &settings, &theme, &structure);
        assert!(html.contains("<h2>Categories</h2>"));
        assert!(html.contains(r#"<a href="/category">"#));
        // No tag template and no tags index page, so no Tags section.
        assert!(!html.contains("<h2>Tags</h2>"));
    }

    #[test]
    fn test_no_rss_entry_without_posts() {
        let (_dir, store, settings, theme) = site();
        let structure = analyze(&store, &theme);
        let xml = generate_sitemap_xml(&store, &settings, &theme, &structure);
        assert!(!xml.contains("rss.xml"));
    }

    #[test]
    fn test_untemplated_custom_page_skipped() {
        let (_dir, store, settings, theme) = site();
        store
            .create(ContentKind::Custom, doc("c1", "docs", &[("pageType", "custom")]))
            .unwrap();
        let structure = analyze(&store, &theme);
        let xml = generate_sitemap_xml(&store, &settings, &theme, &structure);
        assert!(!xml.contains("/docs"));
    }

    #[test]
    fn test_child_with_templated_parent_included() {
        let (_dir, store, settings, theme) = site();
        fs::write(theme.custom_dir.join("docs.html"), "x").unwrap();
        store
            .create(ContentKind::Custom, doc("c1", "docs", &[("pageType", "custom")]))
            .unwrap();
        store
            .create(
                ContentKind::Custom,
                doc("c2", "docs-intro", &[("pageType", "custom"), ("parentPage", "docs")]),
            )
            .unwrap();

        let structure = analyze(&store, &theme);
        let xml = generate_sitemap_xml(&store, &settings, &theme, &structure);
        assert!(xml.contains("<loc>https://example.com/docs</loc>"));
        assert!(xml.contains("<loc>https://example.com/docs/intro</loc>"));
        assert!(xml.contains("<priority>0.6</priority>"));
    }

    #[test]
    fn test_html_sitemap_sections() {
        let (_dir, store, settings, theme) = site();
        store
            .create(
                ContentKind::Post,
                doc("p1", "hello", &[("category", "Tech"), ("tags", "rust, web")]),
            )
            .unwrap();

        let structure = analyze(&store, &theme);
        let html = generate_sitemap_html(&store, &settings, &theme, &structure);
        assert!(html.contains("<h2>Home</h2>"));
        assert!(html.contains("<h2>Blog Posts</h2>"));
        assert!(html.contains("<h2>Categories</h2>"));
        assert!(html.contains("<h2>Tags</h2>"));
        assert!(!html.contains("<h2>Pages</h2>"));
        assert!(html.contains(r#"<a href="/post/hello">"#));
        assert!(html.contains("Generated at"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
    }
}
