//! Template data assembly.
//!
//! Every render receives one JSON object with a fixed set of recognized
//! fields: site settings, theme metadata, menu, the content record and its
//! rendered HTML, pagination, taxonomy aggregates, and navigation. The
//! assembled object passes through the `template_data` filter before the
//! template engine sees it.

use super::{
    markdown::{markdown_to_html, plain_text_preview},
    navigation,
    pagination::Pagination,
};
use crate::{
    content::{ContentKind, ContentStore, Document, QueryEngine},
    hooks::{self, names},
    settings::SiteSettings,
    theme::{
        Theme,
        menu::MenuStore,
        resolver::{CustomTemplateCheck, check_custom_template},
    },
};
use chrono::{Datelike, Utc};
use serde_json::{Map, Value, json};
use std::path::Path;

/// Posts in the `recentPosts` sidebar list.
const RECENT_POSTS: usize = 5;

// ============================================================================
// Assembler
// ============================================================================

pub struct DataAssembler<'a> {
    store: &'a ContentStore,
    settings: &'a SiteSettings,
    theme: &'a Theme,
    menu: &'a MenuStore,
    is_static: bool,
    sibling_index: Option<&'a navigation::SiblingIndex>,
}

impl<'a> DataAssembler<'a> {
    pub fn new(
        store: &'a ContentStore,
        settings: &'a SiteSettings,
        theme: &'a Theme,
        menu: &'a MenuStore,
        is_static: bool,
    ) -> Self {
        Self {
            store,
            settings,
            theme,
            menu,
            is_static,
            sibling_index: None,
        }
    }

    /// Reuse a prebuilt sibling index instead of scanning per page.
    pub fn with_sibling_index(mut self, index: &'a navigation::SiblingIndex) -> Self {
        self.sibling_index = Some(index);
        self
    }

    /// Fields present on every render.
    fn base(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(
            "site".into(),
            serde_json::to_value(self.settings).unwrap_or_default(),
        );
        data.insert(
            "theme".into(),
            json!({
                "name": self.theme.name,
                "info": serde_json::to_value(&self.theme.info).unwrap_or_default(),
            }),
        );
        data.insert("menu".into(), self.menu.load_value());
        data.insert("editable".into(), Value::Bool(false));
        data.insert("currentUser".into(), Value::Null);
        data.insert("year".into(), json!(Utc::now().year()));
        data.insert("isGenerateStatic".into(), Value::Bool(self.is_static));
        data
    }

    /// Homepage: paged published posts plus an optional custom cover page.
    pub fn assemble_home(
        &self,
        posts: &[Document],
        pagination: &Pagination,
        page: usize,
        template_path: &Path,
    ) -> Value {
        let mut data = self.base();
        let mut metadata = Map::new();
        metadata.insert("title".into(), json!(self.settings.site_title));
        metadata.insert("description".into(), json!(self.settings.site_description));

        let check = check_custom_template(template_path);
        if let Some(cover) = self.cover_page(&check) {
            merge_metadata(&mut metadata, &cover.metadata);
            data.insert(
                "content".into(),
                json!(markdown_to_html(&cover.body)),
            );
        }
        if page > 1 {
            append_page_suffix(&mut metadata, page);
        }

        data.insert("metadata".into(), Value::Object(metadata));
        data.insert("fileType".into(), json!("page"));
        data.insert("contentRoute".into(), json!("/"));
        data.insert("posts".into(), self.post_list(posts));
        data.insert("recentPosts".into(), self.recent_posts());
        data.insert(
            "pagination".into(),
            serde_json::to_value(pagination).unwrap_or_default(),
        );
        self.finish(data, &check, template_path)
    }

    /// A single post with related posts and prev/next neighbors resolved.
    pub fn assemble_post(&self, doc: &Document, template_path: &Path) -> Value {
        let mut data = self.base();
        data.insert("metadata".into(), doc.metadata_value());
        data.insert("content".into(), json!(markdown_to_html(&doc.body)));
        data.insert("fileType".into(), json!("post"));
        data.insert("contentRoute".into(), json!(format!("/post/{}", doc.slug())));
        data.insert("contentId".into(), json!(doc.id()));
        data.insert("recentPosts".into(), self.recent_posts());
        self.finish(data, &CustomTemplateCheck::default(), template_path)
    }

    /// A normal or custom page; custom pages carry chain navigation.
    pub fn assemble_page(&self, doc: &Document, template_path: &Path) -> Value {
        let mut data = self.base();
        data.insert("metadata".into(), doc.metadata_value());
        data.insert("content".into(), json!(markdown_to_html(&doc.body)));
        data.insert("fileType".into(), json!("page"));
        data.insert("contentId".into(), json!(doc.id()));

        if doc.is_custom_page() {
            let path = navigation::custom_page_url_path(self.store, doc);
            data.insert("contentRoute".into(), json!(format!("/{path}")));
            data.insert("isCustomPage".into(), Value::Bool(true));
            if let Some(parent) = doc.parent_page() {
                data.insert("parentPage".into(), json!(parent));
            }
            let nav = match self.sibling_index {
                Some(index) => index.for_page(doc),
                None => navigation::sibling_navigation(self.store, doc),
            };
            if let Some(nav) = nav {
                data.insert(
                    "siblingNavigation".into(),
                    serde_json::to_value(nav).unwrap_or_default(),
                );
            }
            data.insert(
                "breadcrumbs".into(),
                serde_json::to_value(navigation::breadcrumbs(self.store, doc))
                    .unwrap_or_default(),
            );
        } else {
            data.insert("contentRoute".into(), json!(format!("/page/{}", doc.slug())));
            data.insert("isCustomPage".into(), Value::Bool(false));
        }
        self.finish(data, &CustomTemplateCheck::default(), template_path)
    }

    /// A category or tag listing at one page of its post list.
    pub fn assemble_taxonomy(
        &self,
        taxonomy: &str,
        term: &str,
        posts: &[Document],
        pagination: &Pagination,
        page: usize,
        template_path: &Path,
    ) -> Value {
        let mut data = self.base();

        let check = check_custom_template(template_path);
        let mut metadata = Map::new();
        if let Some(cover) = self.cover_page(&check) {
            merge_metadata(&mut metadata, &cover.metadata);
            data.insert("content".into(), json!(markdown_to_html(&cover.body)));
        }
        apply_taxonomy_strings(&mut metadata, taxonomy, term, pagination.total_items);
        if page > 1 {
            append_page_suffix(&mut metadata, page);
        }

        data.insert("metadata".into(), Value::Object(metadata));
        data.insert("fileType".into(), json!(taxonomy));
        data.insert("taxonomyType".into(), json!(taxonomy));
        data.insert("taxonomyTerm".into(), json!(term));
        data.insert(
            "contentRoute".into(),
            json!(format!("/{taxonomy}/{}", term_slug(term))),
        );
        data.insert("posts".into(), self.post_list(posts));
        data.insert("recentPosts".into(), self.recent_posts());
        data.insert(
            "pagination".into(),
            serde_json::to_value(pagination).unwrap_or_default(),
        );
        self.finish(data, &check, template_path)
    }

    /// The themed 404 page: `layout.html` with `notFoundRoute` raised.
    pub fn assemble_not_found(&self, template_path: &Path) -> Value {
        self.assemble_error_route("notFoundRoute", "Page Not Found", template_path)
    }

    /// The themed 500 page: `layout.html` with `serverErrorRoute` raised.
    pub fn assemble_server_error(&self, template_path: &Path) -> Value {
        self.assemble_error_route("serverErrorRoute", "Something Went Wrong", template_path)
    }

    fn assemble_error_route(&self, flag: &str, title: &str, template_path: &Path) -> Value {
        let mut data = self.base();
        data.insert("metadata".into(), json!({"title": title}));
        data.insert("fileType".into(), json!("page"));
        data.insert(flag.into(), Value::Bool(true));
        self.finish(data, &CustomTemplateCheck::default(), template_path)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn finish(
        &self,
        mut data: Map<String, Value>,
        check: &CustomTemplateCheck,
        template_path: &Path,
    ) -> Value {
        data.insert(
            "isCustomTemplate".into(),
            Value::Bool(check.is_custom_template),
        );
        data.insert(
            "customPath".into(),
            check
                .template_slug
                .as_deref()
                .map_or(Value::Null, |slug| json!(slug)),
        );

        let template_name = template_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        hooks::apply_filters(
            names::TEMPLATE_DATA,
            Value::Object(data),
            &[json!(template_name)],
        )
    }

    /// The Markdown cover page matching a custom template's slug.
    fn cover_page(&self, check: &CustomTemplateCheck) -> Option<Document> {
        let slug = check.template_slug.as_deref()?;
        self.store
            .get_by_slug(ContentKind::Custom, slug)
            .ok()
            .filter(Document::is_published)
    }

    fn recent_posts(&self) -> Value {
        let engine = QueryEngine::new(self.store);
        self.post_list(&engine.recent_posts(RECENT_POSTS))
    }

    fn post_list(&self, posts: &[Document]) -> Value {
        Value::Array(posts.iter().map(|doc| self.post_record(doc)).collect())
    }

    /// A post as list-item data: frontmatter plus a guaranteed excerpt and url.
    fn post_record(&self, doc: &Document) -> Value {
        let mut record = doc.metadata.clone();
        if !record.contains_key("excerpt") {
            record.insert("excerpt".into(), json!(plain_text_preview(&doc.body, 300)));
        }
        record.insert("url".into(), json!(format!("/post/{}", doc.slug())));
        Value::Object(record)
    }
}

// ============================================================================
// Metadata shaping
// ============================================================================

fn merge_metadata(into: &mut Map<String, Value>, from: &Map<String, Value>) {
    for (key, value) in from {
        into.insert(key.clone(), value.clone());
    }
}

fn apply_taxonomy_strings(
    metadata: &mut Map<String, Value>,
    taxonomy: &str,
    term: &str,
    post_count: usize,
) {
    let (title, subtitle, description) = if taxonomy == "category" {
        (
            format!("Category: {term}"),
            format!("{post_count} posts in {term}"),
            format!("Discover the latest articles in the {term} category"),
        )
    } else {
        (
            format!("Tagged: {term}"),
            format!("{post_count} posts tagged {term}"),
            format!("Read posts tagged {term}"),
        )
    };
    metadata.insert("title".into(), json!(title));
    metadata.insert("subtitle".into(), json!(subtitle));
    metadata.insert("description".into(), json!(description));
}

fn append_page_suffix(metadata: &mut Map<String, Value>, page: usize) {
    let title = metadata
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default();
    metadata.insert("title".into(), json!(format!("{title} - Page {page}")));
}

/// A taxonomy term in URL form.
pub fn term_slug(term: &str) -> String {
    term.to_lowercase().replace(' ', "-")
}

// ============================================================================
// Tests
// ============================================================================
