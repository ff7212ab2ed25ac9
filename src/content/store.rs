//! Filesystem-backed document store.
//!
//! Owns the `posts/`, `pages/`, and `custom/` directories under the content
//! root. Files are named `<slug>.md`; the `id` frontmatter key stays stable
//! across renames, so lookups by id scan the kind directory.
//!
//! Writes serialize the frontmatter deterministically, go to a temporary
//! file in the same directory, and are renamed into place.

use super::{
    document::{ContentKind, Document, is_valid_slug},
    frontmatter,
};
use crate::{
    error::{CoreError, CoreResult},
    hooks::{self, names},
    log,
};
use serde_json::Value;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

/// Content repository rooted at the host-chosen data directory.
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory this store owns.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: ContentKind) -> PathBuf {
        self.root.join(kind.dir())
    }

    fn path_for(&self, kind: ContentKind, slug: &str) -> PathBuf {
        self.kind_dir(kind).join(format!("{slug}.md"))
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Enumerate a kind directory, parsing each `.md` file.
    ///
    /// Per-file parse failures are returned as entries so callers choose
    /// between strict and best-effort behavior.
    pub fn list_entries(
        &self,
        kind: ContentKind,
    ) -> CoreResult<Vec<(PathBuf, CoreResult<Document>)>> {
        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| CoreError::Io(dir.clone(), e))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| {
                let doc = read_document(&path);
                (path, doc)
            })
            .collect())
    }

    /// Strict enumeration: the first unreadable file fails the whole call.
    pub fn list(&self, kind: ContentKind) -> CoreResult<Vec<Document>> {
        self.list_entries(kind)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect()
    }

    /// Best-effort enumeration: parse failures are logged and skipped.
    pub fn list_lenient(&self, kind: ContentKind) -> Vec<Document> {
        self.list_entries(kind)
            .unwrap_or_else(|e| {
                log!("error"; "listing {}: {e}", kind.dir());
                Vec::new()
            })
            .into_iter()
            .filter_map(|(path, doc)| match doc {
                Ok(doc) => Some(doc),
                Err(e) => {
                    log!("warn"; "skipping {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Fetch a document by id.
    pub fn get(&self, kind: ContentKind, id: &str) -> CoreResult<Document> {
        self.list(kind)?
            .into_iter()
            .find(|doc| doc.id() == id)
            .ok_or_else(|| CoreError::not_found(format!("{} `{id}`", kind.label())))
    }

    /// Fetch a document by slug.
    pub fn get_by_slug(&self, kind: ContentKind, slug: &str) -> CoreResult<Document> {
        let path = self.path_for(kind, slug);
        if path.is_file() {
            return read_document(&path);
        }
        // Slug may differ from the file name after manual edits
        self.list(kind)?
            .into_iter()
            .find(|doc| doc.slug() == slug)
            .ok_or_else(|| CoreError::not_found(format!("{} `{slug}`", kind.label())))
    }

    /// First document whose frontmatter `key` equals `value`, optionally
    /// constrained to records with an exact `parentPage`.
    pub fn find_by_frontmatter_property(
        &self,
        kind: ContentKind,
        key: &str,
        value: &str,
        parent_page: Option<&str>,
    ) -> CoreResult<Option<Document>> {
        Ok(self.list(kind)?.into_iter().find(|doc| {
            if let Some(parent) = parent_page {
                if doc.parent_page() != Some(parent) {
                    return false;
                }
            }
            doc.metadata
                .get(key)
                .is_some_and(|field| value_matches(field, value))
        }))
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create a new document. Fails on invalid input, a colliding slug, or a
    /// broken parent chain; fires the kind's created action on success.
    pub fn create(&self, kind: ContentKind, doc: Document) -> CoreResult<Document> {
        self.validate(kind, &doc, None)?;

        let path = self.path_for(kind, doc.slug());
        write_atomic(&path, &frontmatter::serialize_document(&doc.metadata, &doc.body))?;

        hooks::do_action(created_action(kind), &[doc.metadata_value()]);
        Ok(doc)
    }

    /// Replace the document with `id`. A slug change renames the file.
    pub fn update(&self, kind: ContentKind, id: &str, doc: Document) -> CoreResult<Document> {
        let existing = self.get(kind, id)?;
        self.validate(kind, &doc, Some(id))?;

        let new_path = self.path_for(kind, doc.slug());
        write_atomic(&new_path, &frontmatter::serialize_document(&doc.metadata, &doc.body))?;

        let old_path = self.path_for(kind, existing.slug());
        if old_path != new_path && old_path.exists() {
            fs::remove_file(&old_path).map_err(|e| CoreError::Io(old_path, e))?;
        }

        hooks::do_action(updated_action(kind), &[doc.metadata_value()]);
        Ok(doc)
    }

    /// Delete the document with `id`.
    pub fn delete(&self, kind: ContentKind, id: &str) -> CoreResult<()> {
        let doc = self.get(kind, id)?;
        let payload = [doc.metadata_value()];
        hooks::do_action(pre_delete_action(kind), &payload);

        let path = self.path_for(kind, doc.slug());
        fs::remove_file(&path).map_err(|e| CoreError::Io(path, e))?;

        hooks::do_action(deleted_action(kind), &payload);
        Ok(())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Shared create/update validation. `exclude_id` skips the record being
    /// updated during the duplicate-slug check.
    fn validate(&self, kind: ContentKind, doc: &Document, exclude_id: Option<&str>) -> CoreResult<()> {
        if doc.id().is_empty() {
            return Err(CoreError::InvalidInput("missing id".into()));
        }
        if doc.title().is_empty() {
            return Err(CoreError::InvalidInput("missing title".into()));
        }
        if !is_valid_slug(doc.slug()) {
            return Err(CoreError::InvalidInput(format!(
                "invalid slug `{}`",
                doc.slug()
            )));
        }
        if let (Some(created), Some(updated)) = (doc.created_at(), doc.updated_at()) {
            if updated < created {
                return Err(CoreError::InvalidInput(
                    "updatedAt precedes createdAt".into(),
                ));
            }
        }

        let collision = self.list(kind)?.into_iter().any(|other| {
            other.slug() == doc.slug() && exclude_id.is_none_or(|id| other.id() != id)
        });
        if collision {
            return Err(CoreError::DuplicateSlug(doc.slug().to_string()));
        }

        if kind == ContentKind::Custom {
            self.validate_parent_chain(doc)?;
        }
        Ok(())
    }

    /// Walk the parent chain of a custom page: the chain must exist, stay
    /// within the custom kind, and terminate without revisiting a slug.
    fn validate_parent_chain(&self, doc: &Document) -> CoreResult<()> {
        let Some(first_parent) = doc.parent_page() else {
            return Ok(());
        };
        if first_parent == doc.slug() {
            return Err(CoreError::InvalidInput(
                "a page cannot be its own parent".into(),
            ));
        }

        let all = self.list(ContentKind::Custom)?;
        let mut seen: HashSet<String> = HashSet::from([doc.slug().to_string()]);
        let mut current = first_parent.to_string();

        loop {
            if !seen.insert(current.clone()) {
                return Err(CoreError::InvalidInput(format!(
                    "circular parent chain through `{current}`"
                )));
            }
            let Some(parent) = all.iter().find(|p| p.slug() == current) else {
                return Err(CoreError::InvalidInput(format!(
                    "parent page `{current}` not found"
                )));
            };
            if !parent.is_custom_page() {
                return Err(CoreError::InvalidInput(format!(
                    "parent page `{current}` is not a custom page"
                )));
            }
            match parent.parent_page() {
                Some(next) => current = next.to_string(),
                None => return Ok(()),
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Read and parse one document file.
fn read_document(path: &Path) -> CoreResult<Document> {
    let raw = fs::read_to_string(path).map_err(|e| CoreError::Io(path.to_path_buf(), e))?;
    let (metadata, body) = frontmatter::parse_document(&raw)
        .map_err(|reason| CoreError::InvalidFrontmatter(path.to_path_buf(), reason))?;
    Ok(Document::new(metadata, body))
}

/// Write to a temporary file in the target directory, then rename into place.
fn write_atomic(path: &Path, contents: &str) -> CoreResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| CoreError::InvalidInput(format!("bad path `{}`", path.display())))?;
    fs::create_dir_all(parent).map_err(|e| CoreError::Io(parent.to_path_buf(), e))?;

    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let tmp = parent.join(format!(".{file_name}.tmp"));
    fs::write(&tmp, contents).map_err(|e| CoreError::Io(tmp.clone(), e))?;
    fs::rename(&tmp, path).map_err(|e| CoreError::Io(path.to_path_buf(), e))
}

/// Compare a frontmatter value against a string needle.
fn value_matches(field: &Value, needle: &str) -> bool {
    match field {
        Value::String(s) => s == needle,
        Value::Number(n) => n.to_string() == needle,
        Value::Bool(b) => b.to_string() == needle,
        _ => false,
    }
}

const fn created_action(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Post => names::POST_CREATED,
        _ => names::PAGE_CREATED,
    }
}

const fn updated_action(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Post => names::POST_UPDATED,
        _ => names::PAGE_UPDATED,
    }
}

const fn pre_delete_action(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Post => names::PRE_POST_DELETE,
        _ => names::PRE_PAGE_DELETE,
    }
}

const fn deleted_action(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Post => names::POST_DELETED,
        _ => names::PAGE_DELETED,
    }
}

// ============================================================================
// Tests
// ============================================================================
