//! Development server.
//!
//! A lightweight HTTP server built on `tiny_http` that renders routes live
//! from the content directory:
//!
//! - Front-end route dispatch through the same pipeline the SSG uses
//! - Theme asset and upload serving
//! - Port auto-retry when the requested one is taken
//! - Graceful shutdown on Ctrl+C
//!
//! Settings are re-read per request, so edits to `settings.json`, content
//! files, or templates show up on the next refresh.

use crate::{
    content::ContentStore,
    log,
    routes::Router,
    settings::SettingsManager,
    theme::ThemeManager,
};
use anyhow::{Context, Result};
use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the development server. Blocks until Ctrl+C.
pub fn serve_site(data_dir: &Path, interface: &str, port: u16) -> Result<()> {
    let interface: IpAddr = interface.parse().context("invalid interface address")?;
    let (server, addr) = try_bind_port(interface, port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    let store = ContentStore::new(data_dir);
    let themes = ThemeManager::new(data_dir.join("themes"));
    let settings = SettingsManager::load(data_dir.join("settings.json"))?;

    log!("serve"; "http://{addr}");

    for request in server.incoming_requests() {
        // Pick up settings edits without a restart
        if let Err(e) = settings.reload() {
            log!("warn"; "settings reload: {e}");
        }
        if let Err(e) = handle_request(request, &store, &themes, &settings) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!("loop always returns")
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(
    request: Request,
    store: &ContentStore,
    themes: &ThemeManager,
    settings: &SettingsManager,
) -> Result<()> {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

    // Theme assets and uploads are plain files
    if let Some(file) = asset_path(store, themes, settings, path) {
        return serve_file(request, &file);
    }

    let snapshot = settings.get();
    let response = Router::new(store, themes, &snapshot).dispatch(path, query);
    log!("serve"; "{} {path}", response.status);

    let header = content_type_header(response.content_type);
    request
        .respond(
            Response::from_data(response.body)
                .with_status_code(StatusCode(response.status))
                .with_header(header),
        )
        .context("writing response")?;
    Ok(())
}

/// Map `/content/...` and `/assets/...` URLs onto the data directory.
fn asset_path(
    store: &ContentStore,
    themes: &ThemeManager,
    settings: &SettingsManager,
    path: &str,
) -> Option<PathBuf> {
    let file = if let Some(rel) = path.strip_prefix("/content/") {
        store.root().join(sanitize(rel)?)
    } else if let Some(rel) = path.strip_prefix("/assets/") {
        // Shorthand for the active theme's assets
        let theme = themes.active_theme(&settings.get()).ok()?;
        theme.assets_dir.join(sanitize(rel)?)
    } else {
        return None;
    };
    file.is_file().then_some(file)
}

/// Reject any path component that could escape the data directory.
fn sanitize(rel: &str) -> Option<PathBuf> {
    let path = Path::new(rel);
    let clean = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    clean.then(|| path.to_path_buf())
}

fn serve_file(request: Request, file: &Path) -> Result<()> {
    let body = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let header = content_type_header(mime_for(file));
    request
        .respond(Response::from_data(body).with_header(header))
        .context("writing response")?;
    Ok(())
}

fn content_type_header(value: &str) -> Header {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes())
        .unwrap_or_else(|_| Header::from_bytes(&b"Content-Type"[..], &b"text/plain"[..]).unwrap())
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "xsl" | "xml" => "application/xml",
        "pdf" => "application/pdf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "html" => "text/html; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================
