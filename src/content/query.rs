//! Content query engine.
//!
//! Filtering, ordering, pagination, and projection over the document store,
//! plus relation resolution (related posts, prev/next navigation) and the
//! plural-aware field matching behind category and tag lookups.
//!
//! List operations are best-effort: unreadable files are logged and skipped.

use super::{
    document::{ContentKind, Document, compare_newest_first, normalize_tags},
    store::ContentStore,
};
use crate::{
    error::CoreResult,
    render::markdown::{excerpt_text, plain_text_preview},
};
use serde_json::{Value, json};

/// Default summary preview length in characters.
const DEFAULT_PREVIEW_LENGTH: usize = 300;

/// Excerpt cap for related-post records.
const RELATED_EXCERPT_LENGTH: usize = 120;

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone)]
pub struct PostQuery {
    /// Filter by exact status; `None` returns everything.
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
    /// Replace each body with a plain-text preview.
    pub summary_view: bool,
    pub preview_length: usize,
    /// Drop bodies entirely.
    pub frontmatter_only: bool,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: None,
            offset: 0,
            summary_view: false,
            preview_length: DEFAULT_PREVIEW_LENGTH,
            frontmatter_only: false,
        }
    }
}

impl PostQuery {
    pub fn published() -> Self {
        Self {
            status: Some("published".into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub status: Option<String>,
    /// Filter by `pageType` ("normal" or "custom").
    pub page_type: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub frontmatter_only: bool,
}

#[derive(Debug, Clone)]
pub struct GetOptions {
    pub resolve_related_posts: bool,
    pub add_navigation: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            resolve_related_posts: true,
            add_navigation: false,
        }
    }
}

// ============================================================================
// Query Engine
// ============================================================================

pub struct QueryEngine<'a> {
    store: &'a ContentStore,
}

impl<'a> QueryEngine<'a> {
    pub const fn new(store: &'a ContentStore) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &ContentStore {
        self.store
    }

    /// Enumerate posts: filter by status, sort newest-first, paginate,
    /// project.
    pub fn get_posts(&self, query: &PostQuery) -> Vec<Document> {
        let mut posts: Vec<Document> = self
            .store
            .list_lenient(ContentKind::Post)
            .into_iter()
            .filter(|doc| match &query.status {
                Some(status) => doc.status() == status,
                None => true,
            })
            .collect();
        posts.sort_by(compare_newest_first);

        window(posts, query.offset, query.limit)
            .into_iter()
            .map(|mut doc| {
                if query.frontmatter_only {
                    doc.body = String::new();
                } else if query.summary_view {
                    doc.body = plain_text_preview(&doc.body, query.preview_length);
                }
                doc
            })
            .collect()
    }

    /// Enumerate pages: the union of normal and custom pages. No sorting by
    /// default.
    pub fn get_pages(&self, query: &PageQuery) -> Vec<Document> {
        let mut pages = self.store.list_lenient(ContentKind::Page);
        pages.extend(self.store.list_lenient(ContentKind::Custom));

        let pages: Vec<Document> = pages
            .into_iter()
            .filter(|doc| match &query.status {
                Some(status) => doc.status() == status,
                None => true,
            })
            .filter(|doc| match &query.page_type {
                Some(page_type) => doc.page_type() == page_type,
                None => true,
            })
            .collect();

        window(pages, query.offset, query.limit)
            .into_iter()
            .map(|mut doc| {
                if query.frontmatter_only {
                    doc.body = String::new();
                }
                doc
            })
            .collect()
    }

    /// Published posts in the canonical time order.
    pub fn published_posts(&self) -> Vec<Document> {
        self.get_posts(&PostQuery::published())
    }

    /// The `n` most recent published posts as summary views.
    pub fn recent_posts(&self, n: usize) -> Vec<Document> {
        self.get_posts(&PostQuery {
            limit: Some(n),
            summary_view: true,
            ..PostQuery::published()
        })
    }

    /// Load a post by id and attach relation data.
    pub fn get_post(&self, id: &str, options: &GetOptions) -> CoreResult<Document> {
        let doc = self.store.get(ContentKind::Post, id)?;
        Ok(self.enrich_post(doc, options))
    }

    /// Same as [`Self::get_post`], keyed on an arbitrary frontmatter field.
    pub fn get_content_by_property(
        &self,
        kind: ContentKind,
        property: &str,
        value: &str,
        parent_page: Option<&str>,
        options: &GetOptions,
    ) -> CoreResult<Option<Document>> {
        let found =
            self.store
                .find_by_frontmatter_property(kind, property, value, parent_page)?;
        Ok(found.map(|doc| {
            if kind == ContentKind::Post {
                self.enrich_post(doc, options)
            } else {
                doc
            }
        }))
    }

    /// Documents whose `field` (or its plural `field + "s"`) contains
    /// `value`. Matches a scalar string, a list, or a comma-joined string.
    pub fn get_content_by_field_value(
        &self,
        kind: ContentKind,
        field: &str,
        value: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .store
            .list_lenient(kind)
            .into_iter()
            .filter(|doc| doc.is_published())
            .filter(|doc| matches_field_value(doc, field, value))
            .collect();
        docs.sort_by(compare_newest_first);
        window(docs, offset, limit)
    }

    /// Published posts in a category, newest first.
    pub fn get_posts_by_category(&self, term: &str) -> Vec<Document> {
        self.get_content_by_field_value(ContentKind::Post, "category", term, None, 0)
    }

    /// Published posts carrying a tag, newest first.
    pub fn get_posts_by_tag(&self, term: &str) -> Vec<Document> {
        self.get_content_by_field_value(ContentKind::Post, "tag", term, None, 0)
    }

    /// The display form of a taxonomy term addressed by slug, taken from the
    /// first post that carries it.
    pub fn canonical_term(&self, taxonomy: &str, slug: &str) -> Option<String> {
        let posts = self.get_content_by_field_value(ContentKind::Post, taxonomy, slug, None, 0);
        let doc = posts.first()?;
        if taxonomy == "category" {
            return doc.category().map(String::from);
        }
        doc.tags().into_iter().find(|t| term_matches(t, slug))
    }

    /// All category terms across published posts, sorted.
    pub fn all_categories(&self) -> Vec<String> {
        let mut terms: Vec<String> = self
            .published_posts()
            .iter()
            .filter_map(|doc| doc.category().map(String::from))
            .collect();
        terms.sort();
        terms.dedup();
        terms
    }

    /// All tags across published posts, normalized and sorted.
    pub fn all_tags(&self) -> Vec<String> {
        let mut terms: Vec<String> = self
            .published_posts()
            .iter()
            .flat_map(Document::tags)
            .collect();
        terms.sort();
        terms.dedup();
        terms
    }

    /// Generic scan across content kinds.
    pub fn find_content<F>(
        &self,
        kinds: &[ContentKind],
        predicate: F,
        limit: Option<usize>,
        offset: usize,
    ) -> Vec<Document>
    where
        F: Fn(&Document) -> bool,
    {
        let docs: Vec<Document> = kinds
            .iter()
            .flat_map(|kind| self.store.list_lenient(*kind))
            .filter(|doc| predicate(doc))
            .collect();
        window(docs, offset, limit)
    }

    // ========================================================================
    // Relation Resolution
    // ========================================================================

    /// Attach `relatedPostsData` and prev/next navigation to a post.
    fn enrich_post(&self, mut doc: Document, options: &GetOptions) -> Document {
        if options.resolve_related_posts && !doc.related_post_ids().is_empty() {
            let all = self.store.list_lenient(ContentKind::Post);
            let related: Vec<Value> = doc
                .related_post_ids()
                .iter()
                .filter_map(|id| all.iter().find(|p| &p.id() == id))
                .map(related_record)
                .collect();
            doc.metadata
                .insert("relatedPostsData".into(), Value::Array(related));
        }

        if options.add_navigation {
            let ordered = self.published_posts();
            if let Some(index) = ordered.iter().position(|p| p.id() == doc.id()) {
                // The list is newest-first: "next" is the newer neighbor,
                // "prev" the older one.
                if index > 0 {
                    doc.metadata
                        .insert("nextPost".into(), nav_record(&ordered[index - 1]));
                }
                if index + 1 < ordered.len() {
                    doc.metadata
                        .insert("prevPost".into(), nav_record(&ordered[index + 1]));
                }
            }
        }

        doc
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Apply offset and optional limit to an owned list.
fn window(docs: Vec<Document>, offset: usize, limit: Option<usize>) -> Vec<Document> {
    let iter = docs.into_iter().skip(offset);
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

/// Minimal record for a related post reference.
fn related_record(doc: &Document) -> Value {
    let excerpt = doc
        .excerpt()
        .map(String::from)
        .unwrap_or_else(|| plain_text_preview(&doc.body, RELATED_EXCERPT_LENGTH));
    json!({
        "id": doc.id(),
        "title": doc.title(),
        "subtitle": doc.str_field("subtitle").unwrap_or_default(),
        "slug": doc.slug(),
        "featuredImage": doc.metadata.get("featuredImage").cloned().unwrap_or(Value::Null),
        "excerpt": excerpt_text(&excerpt, RELATED_EXCERPT_LENGTH),
    })
}

/// Minimal record for prev/next navigation.
fn nav_record(doc: &Document) -> Value {
    json!({
        "id": doc.id(),
        "title": doc.title(),
        "slug": doc.slug(),
    })
}

/// Check `field` then `field + "s"` against a term.
fn matches_field_value(doc: &Document, field: &str, value: &str) -> bool {
    let plural = format!("{field}s");
    let candidate = doc
        .metadata
        .get(field)
        .or_else(|| doc.metadata.get(&plural));

    match candidate {
        Some(Value::String(s)) => {
            // A scalar may itself be a comma-joined list
            term_matches(s, value) || normalize_tags(candidate).iter().any(|t| term_matches(t, value))
        }
        Some(Value::Array(_)) => normalize_tags(candidate).iter().any(|t| term_matches(t, value)),
        _ => false,
    }
}

/// Term comparison between a display value and a slug form:
/// `"Tech"` matches `"tech"`, `"Getting Started"` matches `"getting-started"`.
fn term_matches(candidate: &str, needle: &str) -> bool {
    let canon = |s: &str| s.trim().to_lowercase().replace(' ', "-");
    canon(candidate) == canon(needle)
}

// ============================================================================
// Tests
// ============================================================================
