//! SEO artifacts: feed, sitemaps, robots.
//!
//! Everything here starts from a single structure-analysis pass over the
//! content store and the active theme, so the feed, both sitemaps, and
//! robots.txt agree on what the site actually contains.

pub mod rss;
pub mod sitemap;

use crate::{
    content::{ContentKind, ContentStore, Document, QueryEngine},
    settings::SiteSettings,
    theme::{
        Theme,
        resolver::{TemplateRequest, resolve_template_path},
    },
};

// ============================================================================
// Structure analysis
// ============================================================================

/// What the site contains, computed in one pass over posts and pages.
#[derive(Debug, Clone, Default)]
pub struct SiteStructure {
    pub has_posts: bool,
    pub has_categories: bool,
    pub has_tags: bool,
    pub has_pages: bool,
    /// Published custom page acting as the blog index, if any.
    pub blog_index_page: Option<String>,
    pub categories_index_page: Option<String>,
    pub tags_index_page: Option<String>,
    pub has_categories_template: bool,
    pub has_tags_template: bool,
    /// Custom pages with no resolvable template anywhere in their chain.
    pub custom_pages_without_templates: Vec<String>,
    /// Custom pages that name a parent.
    pub nested_custom_pages: Vec<String>,
}

/// Analyze the store and theme once.
pub fn analyze(store: &ContentStore, theme: &Theme) -> SiteStructure {
    let query = QueryEngine::new(store);
    let posts = query.published_posts();

    let pages: Vec<Document> = store
        .list_lenient(ContentKind::Page)
        .into_iter()
        .filter(Document::is_published)
        .collect();
    let custom: Vec<Document> = store
        .list_lenient(ContentKind::Custom)
        .into_iter()
        .filter(Document::is_published)
        .collect();

    let mut structure = SiteStructure {
        has_posts: !posts.is_empty(),
        has_categories: !query.all_categories().is_empty(),
        has_tags: !query.all_tags().is_empty(),
        has_pages: !pages.is_empty() || !custom.is_empty(),
        blog_index_page: index_page(&custom, "blog"),
        categories_index_page: index_page(&custom, "category"),
        tags_index_page: index_page(&custom, "tag"),
        has_categories_template: taxonomy_template_exists(theme, "category"),
        has_tags_template: taxonomy_template_exists(theme, "tag"),
        ..SiteStructure::default()
    };

    for page in &custom {
        if page.parent_page().is_some() {
            structure.nested_custom_pages.push(page.slug().to_string());
        }
        if !chain_has_template(theme, page) {
            structure
                .custom_pages_without_templates
                .push(page.slug().to_string());
        }
    }
    structure
}

fn index_page(custom: &[Document], slug: &str) -> Option<String> {
    custom
        .iter()
        .find(|doc| doc.slug() == slug)
        .map(|doc| doc.slug().to_string())
}

fn taxonomy_template_exists(theme: &Theme, taxonomy: &str) -> bool {
    theme.custom_dir.join(format!("{taxonomy}.html")).is_file()
        || theme.templates_dir.join("taxonomy.html").is_file()
}

/// Whether the page itself resolves to a template, walking slug segments
/// upward when it does not. Pages under a templated ancestor inherit its
/// render path.
pub fn chain_has_template(theme: &Theme, doc: &Document) -> bool {
    let mut slug = doc.slug().to_string();
    loop {
        let path = resolve_template_path(theme, &TemplateRequest::custom_page(&slug));
        if !path.ends_with("templates/layout.html") {
            return true;
        }
        match slug.rfind('-') {
            Some(i) => slug.truncate(i),
            None => return false,
        }
    }
}

// ============================================================================
// robots.txt
// ============================================================================

pub fn robots_txt(settings: &SiteSettings, has_posts: bool) -> String {
    let base = settings.base_url();
    let mut out = format!("User-agent: *\nAllow: /\nSitemap: {base}/sitemap.xml\n");
    if has_posts {
        out.push_str(&format!("Sitemap: {base}/rss.xml\n"));
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
