//! Sibling navigation and breadcrumbs for custom page chains.
//!
//! A custom page names its parent by slug in `parentPage`; the full chain is
//! also encoded in the slug itself (`docs-intro-install` is the child of
//! `docs-intro`). URLs and breadcrumb slugs flatten that chain into path
//! segments (`docs/intro/install`).

use crate::content::{ContentKind, ContentStore, Document};
use serde::Serialize;
use std::{cmp::Ordering, collections::HashMap};

// ============================================================================
// Types
// ============================================================================

/// One sibling link; `order` is the position within the sibling group.
#[derive(Debug, Clone, Serialize)]
pub struct SiblingEntry {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub order: usize,
    pub active: bool,
}

/// One breadcrumb; `slug` is the flattened path of the node.
#[derive(Debug, Clone, Serialize)]
pub struct Breadcrumb {
    pub title: String,
    pub slug: String,
    pub order: usize,
    pub active: bool,
}

// ============================================================================
// Chain walking
// ============================================================================

/// Ancestors of `doc` from the root down, excluding `doc` itself.
///
/// The walk stops at a missing parent or after a bounded number of hops; the
/// store validates against cycles on write, but stale files must not hang a
/// render.
pub fn ancestor_chain(store: &ContentStore, doc: &Document) -> Vec<Document> {
    let mut chain = Vec::new();
    let mut parent_slug = doc.parent_page().map(str::to_string);
    for _ in 0..16 {
        let Some(slug) = parent_slug else { break };
        let Ok(parent) = store.get_by_slug(ContentKind::Custom, &slug) else {
            break;
        };
        parent_slug = parent.parent_page().map(str::to_string);
        chain.push(parent);
    }
    chain.reverse();
    chain
}

/// The flattened URL path of a custom page, without a leading slash.
///
/// Each node contributes the segment left after stripping its parent's slug
/// prefix, so `docs-intro-install` under `docs-intro` under `docs` becomes
/// `docs/intro/install`.
pub fn custom_page_url_path(store: &ContentStore, doc: &Document) -> String {
    let mut nodes = ancestor_chain(store, doc);
    nodes.push(doc.clone());
    path_of_chain(&nodes)
}

fn path_of_chain(nodes: &[Document]) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(nodes.len());
    let mut parent_slug: Option<&str> = None;
    for node in nodes {
        let slug = node.slug();
        let segment = parent_slug
            .and_then(|parent| slug.strip_prefix(parent))
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(slug);
        segments.push(segment.to_string());
        parent_slug = Some(slug);
    }
    segments.join("/")
}

// ============================================================================
// Sibling navigation
// ============================================================================

/// Sibling groups for every nested custom page, built in one pass so the
/// static generator can reuse them across the whole run.
pub struct SiblingIndex {
    by_parent: HashMap<String, Vec<SiblingStub>>,
}

struct SiblingStub {
    id: String,
    title: String,
    slug: String,
    url: String,
}

impl SiblingIndex {
    pub fn build(store: &ContentStore) -> Self {
        let mut groups: HashMap<String, Vec<Document>> = HashMap::new();
        for doc in store.list_lenient(ContentKind::Custom) {
            if !doc.is_published() {
                continue;
            }
            if let Some(parent) = doc.parent_page() {
                groups.entry(parent.to_string()).or_default().push(doc);
            }
        }

        let by_parent = groups
            .into_iter()
            .map(|(parent, mut docs)| {
                docs.sort_by(compare_siblings);
                let stubs = docs
                    .iter()
                    .map(|doc| SiblingStub {
                        id: doc.id().to_string(),
                        title: doc.title().to_string(),
                        slug: doc.slug().to_string(),
                        url: format!("/{}", custom_page_url_path(store, doc)),
                    })
                    .collect();
                (parent, stubs)
            })
            .collect();
        Self { by_parent }
    }

    /// Ordered siblings of `doc`, or `None` for top-level pages.
    pub fn for_page(&self, doc: &Document) -> Option<Vec<SiblingEntry>> {
        let parent = doc.parent_page()?;
        let stubs = self.by_parent.get(parent)?;
        let entries = stubs
            .iter()
            .enumerate()
            .map(|(order, stub)| SiblingEntry {
                id: stub.id.clone(),
                title: stub.title.clone(),
                slug: stub.slug.clone(),
                url: stub.url.clone(),
                order,
                active: stub.slug == doc.slug(),
            })
            .collect();
        Some(entries)
    }
}

/// Ordered siblings of a nested custom page, or `None` for top-level pages.
pub fn sibling_navigation(store: &ContentStore, doc: &Document) -> Option<Vec<SiblingEntry>> {
    SiblingIndex::build(store).for_page(doc)
}

fn compare_siblings(a: &Document, b: &Document) -> Ordering {
    match (a.publish_date(), b.publish_date()) {
        (Some(a_date), Some(b_date)) => a_date
            .cmp(&b_date)
            .then_with(|| compare_titles(a.title(), b.title())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_titles(a.title(), b.title()),
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// ============================================================================
// Breadcrumbs
// ============================================================================

/// Ancestors first, then the current page marked active. Slugs are paths.
pub fn breadcrumbs(store: &ContentStore, doc: &Document) -> Vec<Breadcrumb> {
    let mut nodes = ancestor_chain(store, doc);
    nodes.push(doc.clone());

    let last = nodes.len() - 1;
    (0..nodes.len())
        .map(|i| Breadcrumb {
            title: nodes[i].title().to_string(),
            slug: path_of_chain(&nodes[..=i]),
            order: i,
            active: i == last,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
