//! Content subsystem: documents, the filesystem store, and the query engine.

pub mod document;
pub mod frontmatter;
pub mod query;
pub mod store;

pub use document::{ContentKind, Document};
pub use query::{GetOptions, PageQuery, PostQuery, QueryEngine};
pub use store::ContentStore;
