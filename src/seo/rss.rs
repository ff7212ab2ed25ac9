//! RSS 2.0 feed generation.
//!
//! The feed carries only published posts; a site with none produces no feed
//! at all and callers answer 404 (dynamic) or skip the file (static). Items
//! carry Dublin Core creators, category elements with a domain URL, and an
//! enclosure for the featured image when one is set.

use crate::{
    content::{ContentStore, Document, QueryEngine},
    render::markdown::{markdown_to_html, strip_html, truncate_at_word_boundary},
    settings::SiteSettings,
};
use chrono::Utc;
use rss::{
    CategoryBuilder, ChannelBuilder, EnclosureBuilder, GuidBuilder, ItemBuilder,
    extension::dublincore::DublinCoreExtensionBuilder,
    validation::Validate,
};
use std::collections::BTreeMap;

/// Description cap when a post has no explicit excerpt.
const DESCRIPTION_LENGTH: usize = 160;

/// Where page links resolve, which changes the stylesheet reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedMode {
    Dynamic,
    Static,
}

// ============================================================================
// Public API
// ============================================================================

/// Generate the feed XML, or `None` when no published post exists.
pub fn generate_feed(
    store: &ContentStore,
    settings: &SiteSettings,
    theme_name: &str,
    mode: FeedMode,
) -> Option<String> {
    let query = QueryEngine::new(store);
    let posts = query.published_posts();
    if posts.is_empty() {
        return None;
    }

    let base = settings.base_url();
    let items: Vec<rss::Item> = posts
        .iter()
        .map(|post| post_to_item(post, base))
        .collect();

    let namespaces = BTreeMap::from([
        (
            "dc".to_string(),
            "http://purl.org/dc/elements/1.1/".to_string(),
        ),
        (
            "content".to_string(),
            "http://purl.org/rss/1.0/modules/content/".to_string(),
        ),
    ]);

    let mut builder = ChannelBuilder::default();
    builder
        .namespaces(namespaces)
        .title(&settings.site_title)
        .link(base.to_string())
        .description(&settings.site_description)
        .language(Some(settings.rss_site_language.clone()))
        .last_build_date(Some(rfc822(Utc::now())))
        .generator(Some(env!("CARGO_PKG_NAME").to_string()))
        .items(items);
    if !settings.rss_copyright.is_empty() {
        builder.copyright(Some(settings.rss_copyright.clone()));
    }
    let channel = builder.build();

    if let Err(e) = channel.validate() {
        crate::log!("warn"; "rss validation: {e}");
    }
    Some(with_stylesheet(&channel.to_string(), theme_name, mode))
}

// ============================================================================
// Item conversion
// ============================================================================

fn post_to_item(post: &Document, base: &str) -> rss::Item {
    let link = format!("{base}/post/{}", post.slug());
    let creator = post.author().unwrap_or("Admin").to_string();
    let dublin_core = DublinCoreExtensionBuilder::default()
        .creators(vec![creator])
        .build();

    let categories: Vec<rss::Category> = post
        .category()
        .into_iter()
        .map(|term| {
            CategoryBuilder::default()
                .name(term.to_string())
                .domain(Some(format!(
                    "{base}/category/{}",
                    term.to_lowercase().replace(' ', "-")
                )))
                .build()
        })
        .collect();

    let mut builder = ItemBuilder::default();
    builder
        .title(Some(post.title().to_string()))
        .link(Some(link.clone()))
        .guid(Some(
            GuidBuilder::default().permalink(true).value(link).build(),
        ))
        .description(Some(item_description(post)))
        .dublin_core_ext(Some(dublin_core))
        .categories(categories);

    if let Some(date) = post.created_at() {
        builder.pub_date(Some(rfc822(date)));
    }
    if let Some(image) = post.featured_image_url() {
        let url = if image.starts_with("http") {
            image.to_string()
        } else {
            format!("{base}{image}")
        };
        builder.enclosure(Some(
            EnclosureBuilder::default()
                .url(url)
                .mime_type(image_mime_type(image))
                .length("0".to_string())
                .build(),
        ));
    }
    builder.build()
}

/// Explicit excerpt, else the leading stripped text of the rendered body.
/// RFC-822 date with a zero-padded day, as feed readers expect.
fn rfc822(date: chrono::DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

fn item_description(post: &Document) -> String {
    if let Some(excerpt) = post.excerpt() {
        return excerpt.to_string();
    }
    let text = strip_html(&markdown_to_html(&post.body));
    truncate_at_word_boundary(&text, DESCRIPTION_LENGTH)
}

fn image_mime_type(path: &str) -> String {
    let ext = path.rsplit('.').next().unwrap_or_default().to_lowercase();
    let mime = match ext.as_str() {
        "avif" => "image/avif",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

/// Insert the xml-stylesheet instruction right after the XML declaration.
fn with_stylesheet(xml: &str, theme_name: &str, mode: FeedMode) -> String {
    let href = match mode {
        FeedMode::Static => format!("/content/themes/{theme_name}/assets/css/rss-stylesheet.xsl"),
        FeedMode::Dynamic => "/assets/css/rss-stylesheet.xsl".to_string(),
    };
    let pi = format!(r#"<?xml-stylesheet type="text/xsl" href="{href}"?>"#);
    match xml.find("?>") {
        Some(end) => format!("{}{pi}{}", &xml[..end + 2], &xml[end + 2..]),
        None => format!("{pi}{xml}"),
    }
}

// ============================================================================
// Tests
// ============================================================================
