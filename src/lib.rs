//! File-backed Markdown CMS core and static site generator.
//!
//! Content lives as frontmatter-bearing Markdown files under a data
//! directory; themes are plain template directories. The same render
//! pipeline backs the live preview server and the static generator.

pub mod bulk;
pub mod cli;
pub mod content;
pub mod error;
pub mod generator;
pub mod hooks;
pub mod logger;
pub mod render;
pub mod routes;
pub mod seo;
pub mod serve;
pub mod settings;
pub mod theme;
