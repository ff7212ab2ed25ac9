//! Core error taxonomy.
//!
//! Every failure surfaced by the content store, theme manager, or render
//! pipeline is one of these variants. Each variant maps to a stable string
//! code used by the JSON endpoint surface (`{success: false, error, code}`).

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the cms core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("duplicate slug `{0}`")]
    DuplicateSlug(String),

    #[error("invalid frontmatter in `{0}`: {1}")]
    InvalidFrontmatter(PathBuf, String),

    #[error("invalid json in `{0}`: {1}")]
    InvalidJson(PathBuf, String),

    #[error("io error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("forbidden operation: {0}")]
    Forbidden(String),

    #[error("template error: {0}")]
    Template(String),
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Stable error code for the JSON surface.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::DuplicateSlug(_) => "DUPLICATE_SLUG",
            Self::InvalidFrontmatter(..) => "INVALID_FRONTMATTER",
            Self::InvalidJson(..) => "INVALID_JSON",
            Self::Io(..) => "IO_ERROR",
            Self::Forbidden(_) => "FORBIDDEN_OPERATION",
            Self::Template(_) => "TEMPLATE_ERROR",
        }
    }

    /// Shorthand for a NOT_FOUND error with a formatted subject.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
