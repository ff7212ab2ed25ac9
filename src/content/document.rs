//! Document model and typed metadata accessors.
//!
//! A `Document` is a frontmatter mapping plus a raw Markdown body. Accessors
//! pull the required keys out of the heterogeneous metadata; tag
//! normalization and the canonical newest-first ordering live here so every
//! caller applies them identically.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::{cmp::Ordering, sync::LazyLock};

// ============================================================================
// Content Kinds
// ============================================================================

/// The three document kinds, each backed by its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Post,
    Page,
    Custom,
}

impl ContentKind {
    /// Directory name under the content root.
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Post => "posts",
            Self::Page => "pages",
            Self::Custom => "custom",
        }
    }

    /// Singular label used in error messages and hook payloads.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
            Self::Custom => "custom page",
        }
    }

    /// Whether this kind is a page variant (normal or custom).
    pub const fn is_page(self) -> bool {
        matches!(self, Self::Page | Self::Custom)
    }
}

// ============================================================================
// Document
// ============================================================================

/// A Markdown document with its frontmatter metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub metadata: Map<String, Value>,
    pub body: String,
}

impl Document {
    pub fn new(metadata: Map<String, Value>, body: impl Into<String>) -> Self {
        Self {
            metadata,
            body: body.into(),
        }
    }

    /// String-typed metadata field, `None` when absent or non-string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn id(&self) -> &str {
        self.str_field("id").unwrap_or_default()
    }

    pub fn slug(&self) -> &str {
        self.str_field("slug").unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.str_field("title").unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        self.str_field("status").unwrap_or("draft")
    }

    pub fn is_published(&self) -> bool {
        self.status() == "published"
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.str_field("createdAt").and_then(parse_datetime)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.str_field("updatedAt").and_then(parse_datetime)
    }

    /// Publish date used for feed output and sibling ordering; falls back to
    /// `createdAt` when absent.
    pub fn publish_date(&self) -> Option<DateTime<Utc>> {
        self.str_field("publishDate")
            .and_then(parse_datetime)
            .or_else(|| self.created_at())
    }

    /// `pageType` frontmatter; normal pages may omit it.
    pub fn page_type(&self) -> &str {
        self.str_field("pageType").unwrap_or("normal")
    }

    pub fn is_custom_page(&self) -> bool {
        self.page_type() == "custom"
    }

    pub fn parent_page(&self) -> Option<&str> {
        self.str_field("parentPage").filter(|s| !s.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.str_field("category").filter(|s| !s.is_empty())
    }

    /// Normalized tag list (see [`normalize_tags`]).
    pub fn tags(&self) -> Vec<String> {
        normalize_tags(self.metadata.get("tags"))
    }

    pub fn author(&self) -> Option<&str> {
        self.str_field("author").filter(|s| !s.is_empty())
    }

    pub fn excerpt(&self) -> Option<&str> {
        self.str_field("excerpt").filter(|s| !s.is_empty())
    }

    /// `relatedPosts` id list, ignoring non-string entries.
    pub fn related_post_ids(&self) -> Vec<&str> {
        self.metadata
            .get("relatedPosts")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// URL of `featuredImage`, stored either as a plain string or as a
    /// mapping with a `url` key.
    pub fn featured_image_url(&self) -> Option<&str> {
        match self.metadata.get("featuredImage")? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Object(map) => map
                .get("url")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    /// Metadata as a JSON value (for template data and hook payloads).
    pub fn metadata_value(&self) -> Value {
        Value::Object(self.metadata.clone())
    }
}

// ============================================================================
// Ordering + Normalization
// ============================================================================

/// Canonical public ordering: `createdAt` descending, ties broken by `id`
/// ascending so output is deterministic across runs.
pub fn compare_newest_first(a: &Document, b: &Document) -> Ordering {
    match (b.created_at(), a.created_at()) {
        (Some(b_date), Some(a_date)) => b_date.cmp(&a_date).then_with(|| a.id().cmp(b.id())),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.id().cmp(b.id()),
    }
}

/// Normalize a `tags` value: accepts a list of strings or a single
/// comma-joined string, returns a trimmed list with empty entries removed.
pub fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Validate a slug: lowercase ASCII letters/digits/hyphens, non-empty,
/// hyphens only between segments.
pub fn is_valid_slug(slug: &str) -> bool {
    static RE_SLUG: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());
    RE_SLUG.is_match(slug)
}

/// Parse an ISO-8601 timestamp; bare dates are treated as midnight UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn doc(fields: Value) -> Document {
        let Value::Object(metadata) = fields else {
            panic!("expected object");
        };
        Document::new(metadata, "")
    }

    #[test]
    fn test_required_accessors() {
        let d = doc(json!({
            "id": "p1",
            "title": "Hello",
            "slug": "hello",
            "status": "published",
            "createdAt": "2024-01-02T10:00:00Z",
        }));
        assert_eq!(d.id(), "p1");
        assert_eq!(d.title(), "Hello");
        assert!(d.is_published());
        assert!(d.created_at().is_some());
    }

    #[test]
    fn test_missing_status_is_draft() {
        let d = doc(json!({"id": "x"}));
        assert_eq!(d.status(), "draft");
        assert!(!d.is_published());
    }

    #[test]
    fn test_publish_date_falls_back_to_created_at() {
        let d = doc(json!({"createdAt": "2024-03-01"}));
        assert!(d.publish_date().is_some());

        let d = doc(json!({
            "createdAt": "2024-03-01",
            "publishDate": "2024-04-01",
        }));
        let publish = d.publish_date().unwrap();
        assert_eq!(publish.format("%Y-%m-%d").to_string(), "2024-04-01");
    }

    #[test]
    fn test_normalize_tags_list() {
        let tags = normalize_tags(Some(&json!([" rust", "cms ", "", "web"])));
        assert_eq!(tags, vec!["rust", "cms", "web"]);
    }

    #[test]
    fn test_normalize_tags_comma_string() {
        let tags = normalize_tags(Some(&json!("rust, cms,,web ")));
        assert_eq!(tags, vec!["rust", "cms", "web"]);
    }

    #[test]
    fn test_normalize_tags_idempotent() {
        let once = normalize_tags(Some(&json!(" a, b ,c")));
        let twice = normalize_tags(Some(&json!(once.clone())));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_tags_equivalent_forms() {
        let from_string = normalize_tags(Some(&json!("a, b, c")));
        let from_list = normalize_tags(Some(&json!(["a", "b", "c"])));
        assert_eq!(from_string, from_list);
    }

    #[test]
    fn test_compare_newest_first() {
        let newer = doc(json!({"id": "a", "createdAt": "2024-01-02"}));
        let older = doc(json!({"id": "b", "createdAt": "2024-01-01"}));
        assert_eq!(compare_newest_first(&newer, &older), Ordering::Less);

        // Tie broken by id ascending
        let a = doc(json!({"id": "a", "createdAt": "2024-01-01"}));
        let b = doc(json!({"id": "b", "createdAt": "2024-01-01"}));
        assert_eq!(compare_newest_first(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("hello"));
        assert!(is_valid_slug("hello-world-2"));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug("hello_world"));
        assert!(!is_valid_slug("-hello"));
        assert!(!is_valid_slug("hello-"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_parse_datetime_forms() {
        assert!(parse_datetime("2024-01-02T10:00:00Z").is_some());
        assert!(parse_datetime("2024-01-02T10:00:00+02:00").is_some());
        assert!(parse_datetime("2024-01-02T10:00:00").is_some());
        assert!(parse_datetime("2024-01-02").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_related_post_ids() {
        let d = doc(json!({"relatedPosts": ["a", "b", 3]}));
        assert_eq!(d.related_post_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_featured_image_url_forms() {
        let plain = doc(json!({"featuredImage": "/uploads/a.png"}));
        assert_eq!(plain.featured_image_url(), Some("/uploads/a.png"));

        let mapped = doc(json!({"featuredImage": {"id": "i1", "url": "/uploads/b.jpg"}}));
        assert_eq!(mapped.featured_image_url(), Some("/uploads/b.jpg"));

        let none = doc(json!({"featuredImage": ""}));
        assert_eq!(none.featured_image_url(), None);
    }

    #[test]
    fn test_kind_dirs() {
        assert_eq!(ContentKind::Post.dir(), "posts");
        assert_eq!(ContentKind::Page.dir(), "pages");
        assert_eq!(ContentKind::Custom.dir(), "custom");
        assert!(ContentKind::Custom.is_page());
        assert!(!ContentKind::Post.is_page());
    }
}
