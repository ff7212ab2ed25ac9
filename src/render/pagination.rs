//! Page windows and page-link URLs.
//!
//! A pagination record always accompanies a paged list render. URL shape
//! depends on the render mode: the dynamic server uses `?page=<n>` query
//! strings, the static generator emits either clean directory URLs
//! (`<base>/page/<n>`) or `.html` sibling files (`<base>/page-<n>.html`).

use serde::Serialize;

// ============================================================================
// Types
// ============================================================================

/// How page links are formed.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlMode {
    /// Request-time rendering; pages are `?page=<n>`.
    Dynamic,
    /// Static output with directory URLs; pages are `<base>/page/<n>`.
    StaticClean { base: String },
    /// Static output with `.html` URLs; pages are `<base>/page-<n>.html`.
    StaticExt { base: String },
}

/// Links to the surrounding pages of the current window.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageUrls {
    pub first: String,
    pub prev: Option<String>,
    pub current: String,
    pub next: Option<String>,
    pub last: String,
}

/// The pagination record attached to template data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_items: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub prev_page: Option<usize>,
    pub next_page: Option<usize>,
    pub urls: PageUrls,
}

// ============================================================================
// Construction
// ============================================================================

impl Pagination {
    /// Build the record for one page of a list.
    ///
    /// `page` is clamped into `1..=totalPages`; an empty list still has one
    /// (empty) page so templates always see a well-formed record.
    pub fn build(total_items: usize, page_size: usize, page: usize, mode: &UrlMode) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        let current_page = page.clamp(1, total_pages);

        let prev_page = (current_page > 1).then(|| current_page - 1);
        let next_page = (current_page < total_pages).then(|| current_page + 1);

        Self {
            urls: PageUrls {
                first: mode.page_url(1),
                prev: prev_page.map(|p| mode.page_url(p)),
                current: mode.page_url(current_page),
                next: next_page.map(|p| mode.page_url(p)),
                last: mode.page_url(total_pages),
            },
            current_page,
            total_items,
            page_size,
            total_pages,
            prev_page,
            next_page,
        }
    }

    /// The slice of `items` belonging to the current page.
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.current_page - 1) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        if start >= items.len() {
            &[]
        } else {
            &items[start..end]
        }
    }
}

impl UrlMode {
    /// Clean-URL static mode for a content base path like `/post/hello`.
    /// The homepage passes `/`.
    pub fn static_clean(base: impl Into<String>) -> Self {
        Self::StaticClean { base: base.into() }
    }

    /// Extension-URL static mode for a base like `/post/hello.html`.
    pub fn static_ext(base: impl Into<String>) -> Self {
        Self::StaticExt { base: base.into() }
    }

    fn page_url(&self, page: usize) -> String {
        match self {
            Self::Dynamic => format!("?page={page}"),
            Self::StaticClean { base } => {
                if page == 1 {
                    if base.is_empty() { "/".to_string() } else { base.clone() }
                } else {
                    let base = base.trim_end_matches('/');
                    format!("{base}/page/{page}")
                }
            }
            Self::StaticExt { base } => {
                if page == 1 {
                    base.clone()
                } else if let Some(stem) = base.strip_suffix(".html") {
                    // `/post/hello.html` -> `/post/hello/page-2.html`; the
                    // homepage `/` keeps its pages at the root.
                    format!("{stem}/page-{page}.html")
                } else {
                    let stem = base.trim_end_matches('/');
                    format!("{stem}/page-{page}.html")
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        let p = Pagination::build(25, 10, 2, &UrlMode::Dynamic);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.prev_page, Some(1));
        assert_eq!(p.next_page, Some(3));
    }

    #[test]
    fn test_page_clamped() {
        let p = Pagination::build(25, 10, 99, &UrlMode::Dynamic);
        assert_eq!(p.current_page, 3);
        assert_eq!(p.next_page, None);

        let p = Pagination::build(25, 10, 0, &UrlMode::Dynamic);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.prev_page, None);
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let p = Pagination::build(0, 10, 1, &UrlMode::Dynamic);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.prev_page, None);
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn test_dynamic_urls() {
        let p = Pagination::build(30, 10, 2, &UrlMode::Dynamic);
        assert_eq!(p.urls.first, "?page=1");
        assert_eq!(p.urls.prev.as_deref(), Some("?page=1"));
        assert_eq!(p.urls.current, "?page=2");
        assert_eq!(p.urls.next.as_deref(), Some("?page=3"));
        assert_eq!(p.urls.last, "?page=3");
    }

    #[test]
    fn test_static_clean_urls() {
        let mode = UrlMode::static_clean("/category/rust");
        let p = Pagination::build(30, 10, 2, &mode);
        assert_eq!(p.urls.first, "/category/rust");
        assert_eq!(p.urls.current, "/category/rust/page/2");
        assert_eq!(p.urls.last, "/category/rust/page/3");
    }

    #[test]
    fn test_static_clean_home() {
        let mode = UrlMode::static_clean("/");
        let p = Pagination::build(30, 10, 3, &mode);
        assert_eq!(p.urls.first, "/");
        assert_eq!(p.urls.current, "/page/3");
    }

    #[test]
    fn test_static_ext_urls() {
        let mode = UrlMode::static_ext("/category/rust.html");
        let p = Pagination::build(30, 10, 2, &mode);
        assert_eq!(p.urls.first, "/category/rust.html");
        assert_eq!(p.urls.current, "/category/rust/page-2.html");
    }

    #[test]
    fn test_static_ext_home() {
        let mode = UrlMode::static_ext("/");
        let p = Pagination::build(30, 10, 2, &mode);
        assert_eq!(p.urls.first, "/");
        assert_eq!(p.urls.current, "/page-2.html");
    }

    #[test]
    fn test_window() {
        let items: Vec<usize> = (0..25).collect();
        let p = Pagination::build(items.len(), 10, 3, &UrlMode::Dynamic);
        assert_eq!(p.window(&items), &[20, 21, 22, 23, 24]);

        let p = Pagination::build(items.len(), 10, 1, &UrlMode::Dynamic);
        assert_eq!(p.window(&items).len(), 10);
    }
}
