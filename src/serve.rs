use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Router,
};
use thiserror::Error;
use tokio::signal;
use tower_http::compression::CompressionLayer;

use crate::config::SiteConfig;
use crate::content;
use crate::html;
use crate::web_assets;

/// Maximum number of consecutive ports to try before giving up.
const MAX_PORT_ATTEMPTS: u16 = 100;

/// Maximum static file size that will be read and served (16 MiB).
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("bind {addr} failed: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("exhausted {attempts} port candidates starting at {start}; all ports in use")]
    PortsExhausted { start: u16, attempts: u16 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Shared application state passed to all request handlers via `Arc<AppState>`.
pub struct AppState {
    /// Fully rendered page, built once at startup.
    pub page: String,
    /// Strong validator for `page`.
    pub page_etag: String,
    /// Directory the page images are served from.
    pub static_root: PathBuf,
    /// Canonicalized `static_root` used for symlink-safe containment checks.
    pub canonical_root: PathBuf,
}

impl AppState {
    pub fn new(config: &SiteConfig, footer_text: &str) -> Self {
        let page = html::build_page(config, footer_text);
        let page_etag = content_etag(page.as_bytes());
        let static_root = config.static_dir.clone();
        let canonical_root =
            std::fs::canonicalize(&static_root).unwrap_or_else(|_| static_root.clone());
        Self {
            page,
            page_etag,
            static_root,
            canonical_root,
        }
    }
}

/// Attempt to bind a TCP listener on `bind_addr` starting at `start_port`.
///
/// On `EADDRINUSE` the port is incremented by one and the attempt is retried up
/// to `MAX_PORT_ATTEMPTS` times.  Any other OS error causes an immediate failure
/// without further retries.
pub fn bind_with_retry(bind_addr: &str, start_port: u16) -> Result<(TcpListener, u16), ServeError> {
    let mut port = start_port;
    tracing::debug!(port, "bind: trying");
    for _ in 0..MAX_PORT_ATTEMPTS {
        let addr = format!("{}:{}", bind_addr, port);
        match TcpListener::bind(&addr) {
            Ok(listener) => {
                tracing::debug!(port, "bind: success");
                return Ok((listener, port));
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                let next = port.wrapping_add(1);
                tracing::debug!(port, next, "bind: address in use");
                port = next;
            }
            Err(source) => return Err(ServeError::Bind { addr, source }),
        }
    }
    Err(ServeError::PortsExhausted {
        start: start_port,
        attempts: MAX_PORT_ATTEMPTS,
    })
}

// ---------------------------------------------------------------------------
// Path resolution helpers
// ---------------------------------------------------------------------------

/// Percent-decode a URL path byte-by-byte (RFC 3986 §2.1).
///
/// Returns `None` if the encoding is malformed (truncated `%XX` sequence or
/// non-hex digit) or if the decoded byte sequence is not valid UTF-8.
pub fn percent_decode(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return None;
            }
            let hi = hex_digit(bytes[i + 1])?;
            let lo = hex_digit(bytes[i + 2])?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Normalize a decoded URL path, stripping `.` and `..` components.
///
/// Returns `None` if a `..` would escape the root, which signals a
/// path-traversal attempt.
pub fn normalize_path(decoded: &str) -> Option<PathBuf> {
    let mut parts: Vec<&str> = Vec::new();
    for component in decoded.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            name => parts.push(name),
        }
    }
    Some(parts.iter().collect())
}

/// Derive the `Content-Type` value from a file extension (case-insensitive).
///
/// Returns `application/octet-stream` for any unrecognised extension so that
/// browsers never perform MIME sniffing on unknown types.
pub fn mime_for_ext(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "text/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Check whether canonical `path` lies inside canonical `root`.
fn contained_in(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

fn content_etag(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

/// Validator for a file on disk, derived from its size and mtime.
fn file_etag(len: u64, modified: Option<SystemTime>) -> String {
    let secs = modified.map(unix_secs).unwrap_or(0);
    format!("\"{:x}-{:x}\"", len, secs)
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// HTTP dates have one-second resolution; compare at that granularity.
fn truncate_to_secs(t: SystemTime) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(unix_secs(t))
}

/// Decide whether a conditional request can be answered with `304`.
///
/// `If-None-Match` takes precedence over `If-Modified-Since` (RFC 9110 §13.2.2).
fn is_not_modified(headers: &HeaderMap, etag: &str, modified: Option<SystemTime>) -> bool {
    if let Some(value) = headers.get(header::IF_NONE_MATCH) {
        let Ok(value) = value.to_str() else {
            return false;
        };
        return value.split(',').map(str::trim).any(|tag| {
            tag == "*" || tag == etag || tag.strip_prefix("W/") == Some(etag)
        });
    }
    let Some(modified) = modified else {
        return false;
    };
    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
        .map(|since| truncate_to_secs(modified) <= since)
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn plain_response(status: StatusCode, body: String) -> Response {
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    resp
}

/// 404 Not Found with mandatory security headers.
fn not_found_response() -> Response {
    plain_response(StatusCode::NOT_FOUND, "Not Found".to_owned())
}

/// 413 Content Too Large with mandatory security headers.
fn too_large_response(norm_path: &str, size: u64) -> Response {
    plain_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        format!(
            "Content Too Large: {} ({} bytes exceeds {} byte limit)",
            norm_path, size, MAX_FILE_SIZE
        ),
    )
}

/// Build a `200` (or `304` when `not_modified`) response with validators.
fn cacheable_response(
    content_type: &str,
    body: Body,
    etag: &str,
    modified: Option<SystemTime>,
    not_modified: bool,
) -> Response {
    let status = if not_modified {
        StatusCode::NOT_MODIFIED
    } else {
        StatusCode::OK
    };
    let body = if not_modified { Body::empty() } else { body };
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::ETAG, etag);
    if let Some(m) = modified {
        builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(m));
    }
    builder.body(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "response: builder rejected headers");
        plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_owned())
    })
}

fn asset_response(content_type: &'static str, body: &'static str) -> Response {
    let mut resp = Response::new(Body::from(body));
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    resp
}

// ---------------------------------------------------------------------------
// Axum request handler
// ---------------------------------------------------------------------------

/// Main request handler.
///
/// 0. `/` and `/index.html` return the prebuilt page; the embedded stylesheet
///    and script are served from constants.
/// 1. Percent-decode the raw request path (before any normalisation).
/// 2. Normalise: strip `.`/`..`; reject traversal above root.
/// 3. Resolve inside `static_root`; only regular files are served.
/// 4. Canonicalise and re-verify containment in `canonical_root`.
/// 5. Reject files larger than `MAX_FILE_SIZE` with 413.
/// 6. Serve with `ETag`/`Last-Modified`, answering conditional requests with 304.
///
/// All responses include `X-Content-Type-Options: nosniff`.
async fn serve_handler(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let raw_path = req.uri().path().to_owned();
    let headers = req.headers();

    match raw_path.as_str() {
        "/" | "/index.html" => {
            let not_modified = is_not_modified(headers, &state.page_etag, None);
            tracing::info!(path = %raw_path, mode = "page", not_modified, "request");
            return cacheable_response(
                "text/html; charset=utf-8",
                Body::from(state.page.clone()),
                &state.page_etag,
                None,
                not_modified,
            );
        }
        web_assets::CSS_PATH => {
            tracing::info!(path = %raw_path, mode = "asset", "request");
            return asset_response("text/css; charset=utf-8", web_assets::CSS);
        }
        web_assets::JS_PATH => {
            tracing::info!(path = %raw_path, mode = "asset", "request");
            return asset_response("text/javascript; charset=utf-8", web_assets::JS);
        }
        _ => {}
    }

    let Some(decoded) = percent_decode(&raw_path) else {
        tracing::info!(path = %raw_path, reason = "invalid-percent-encoding", "resolve: denied");
        return not_found_response();
    };

    if decoded.contains('\0') {
        tracing::info!(path = %raw_path, reason = "null-byte", "resolve: denied");
        return not_found_response();
    }

    let Some(normalized) = normalize_path(&decoded) else {
        tracing::info!(path = %raw_path, reason = "path-traversal", "resolve: denied");
        return not_found_response();
    };
    let norm_display = normalized.display().to_string();
    let candidate = state.static_root.join(&normalized);

    match tokio::fs::metadata(&candidate).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            tracing::info!(path = %norm_display, reason = "not-found", "resolve: denied");
            return not_found_response();
        }
    }

    let canonical = match tokio::fs::canonicalize(&candidate).await {
        Ok(c) => c,
        Err(_) => {
            tracing::info!(path = %norm_display, reason = "canonicalize-failed", "resolve: denied");
            return not_found_response();
        }
    };
    if !contained_in(&canonical, &state.canonical_root) {
        tracing::info!(
            path = %norm_display,
            reason = "outside-root",
            canonical = %canonical.display(),
            "resolve: denied"
        );
        return not_found_response();
    }

    let meta = match tokio::fs::metadata(&canonical).await {
        Ok(m) => m,
        Err(_) => {
            tracing::info!(path = %norm_display, reason = "metadata-failed", "resolve: denied");
            return not_found_response();
        }
    };
    let size = meta.len();
    if size > MAX_FILE_SIZE {
        tracing::info!(path = %norm_display, reason = "too-large", size, "resolve: denied");
        return too_large_response(&norm_display, size);
    }

    let modified = meta.modified().ok();
    let etag = file_etag(size, modified);
    let ext = canonical
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let content_type = mime_for_ext(ext);

    if is_not_modified(headers, &etag, modified) {
        tracing::info!(path = %norm_display, mode = "static", "request: not modified");
        return cacheable_response(content_type, Body::empty(), &etag, modified, true);
    }

    let bytes = match tokio::fs::read(&canonical).await {
        Ok(b) => b,
        Err(_) => return not_found_response(),
    };
    tracing::info!(path = %norm_display, mode = "static", size, "request");
    cacheable_response(content_type, Body::from(bytes), &etag, modified, false)
}

/// Build the router for `state`, with response compression.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(serve_handler)
        .layer(CompressionLayer::new().gzip(true).br(true))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the HTTP server with `config`.
///
/// Binds to `config.bind` starting at `config.port`, retrying on `EADDRINUSE`
/// up to 100 times.  The server shuts down cleanly when SIGINT (Ctrl+C) is
/// received.
pub async fn run_serve(config: SiteConfig) -> Result<(), ServeError> {
    if !config.static_dir.is_dir() {
        tracing::warn!(
            dir = %config.static_dir.display(),
            "serve: static directory missing; page images will 404"
        );
    }
    let state = Arc::new(AppState::new(&config, &content::current_footer_text()));

    let (std_listener, bound_port) = bind_with_retry(&config.bind, config.port)?;
    std_listener.set_nonblocking(true)?;
    let listener = tokio::net::TcpListener::from_std(std_listener)?;

    println!("zoonosis-guide serve");
    println!("static: {}", state.static_root.display());
    println!("url:   http://{}:{}/", config.bind, bound_port);
    tracing::info!(bind = %config.bind, port = bound_port, "serve: listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "shutdown: cannot listen for SIGINT");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown: complete");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    // --- percent_decode ---

    #[test]
    fn decode_plain_ascii() {
        assert_eq!(percent_decode("/images/logo.png").unwrap(), "/images/logo.png");
    }

    #[test]
    fn decode_dot_dot_mixed_case() {
        assert_eq!(percent_decode("%2e%2E").unwrap(), "..");
    }

    #[test]
    fn decode_encoded_slash() {
        assert_eq!(percent_decode("%2e%2e%2f").unwrap(), "../");
    }

    #[test]
    fn decode_cyrillic_file_name() {
        assert_eq!(percent_decode("/%D0%BB%D0%BE%D0%B3%D0%BE.png").unwrap(), "/лого.png");
    }

    #[test]
    fn decode_truncated_sequence_is_error() {
        assert!(percent_decode("%2").is_none());
        assert!(percent_decode("%").is_none());
    }

    #[test]
    fn decode_invalid_hex_is_error() {
        assert!(percent_decode("%zz").is_none());
    }

    #[test]
    fn decode_invalid_utf8_sequence_is_error() {
        assert!(percent_decode("%80").is_none());
    }

    // --- normalize_path ---

    #[test]
    fn normalize_simple_path() {
        assert_eq!(
            normalize_path("/images/image.png").unwrap(),
            PathBuf::from("images/image.png")
        );
    }

    #[test]
    fn normalize_root_gives_empty() {
        assert_eq!(normalize_path("/").unwrap(), PathBuf::new());
    }

    #[test]
    fn normalize_dot_and_dotdot_within_root() {
        assert_eq!(normalize_path("/a/./b/../c").unwrap(), PathBuf::from("a/c"));
    }

    #[test]
    fn normalize_traversal_above_root_rejected() {
        assert!(normalize_path("/../etc/passwd").is_none());
        assert!(normalize_path("/images/../../etc/passwd").is_none());
    }

    #[test]
    fn normalize_encoded_traversal_rejected() {
        let decoded = percent_decode("/%2e%2e%2fetc%2fpasswd").unwrap();
        assert!(normalize_path(&decoded).is_none());
    }

    // --- mime_for_ext ---

    #[test]
    fn mime_images() {
        assert_eq!(mime_for_ext("png"), "image/png");
        assert_eq!(mime_for_ext("JPG"), "image/jpeg");
        assert_eq!(mime_for_ext("svg"), "image/svg+xml");
        assert_eq!(mime_for_ext("webp"), "image/webp");
    }

    #[test]
    fn mime_unknown_extension_is_octet_stream() {
        assert_eq!(mime_for_ext("md"), "application/octet-stream");
        assert_eq!(mime_for_ext(""), "application/octet-stream");
    }

    // --- conditional requests ---

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn etag_match_is_not_modified() {
        let h = headers(&[(header::IF_NONE_MATCH, "\"a\", \"b\"")]);
        assert!(is_not_modified(&h, "\"b\"", None));
        assert!(!is_not_modified(&h, "\"c\"", None));
    }

    #[test]
    fn weak_and_wildcard_etags_match() {
        assert!(is_not_modified(&headers(&[(header::IF_NONE_MATCH, "W/\"x\"")]), "\"x\"", None));
        assert!(is_not_modified(&headers(&[(header::IF_NONE_MATCH, "*")]), "\"x\"", None));
    }

    #[test]
    fn if_none_match_takes_precedence() {
        let future = httpdate::fmt_http_date(SystemTime::now() + Duration::from_secs(3600));
        let h = headers(&[
            (header::IF_NONE_MATCH, "\"other\""),
            (header::IF_MODIFIED_SINCE, &future),
        ]);
        assert!(!is_not_modified(&h, "\"x\"", Some(SystemTime::now())));
    }

    #[test]
    fn modified_since_compares_whole_seconds() {
        let mtime = UNIX_EPOCH + Duration::from_millis(1_700_000_000_500);
        let same_second = httpdate::fmt_http_date(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        let h = headers(&[(header::IF_MODIFIED_SINCE, &same_second)]);
        assert!(is_not_modified(&h, "\"x\"", Some(mtime)));

        let older = headers(&[(header::IF_MODIFIED_SINCE, "Thu, 01 Jan 1970 00:00:00 GMT")]);
        assert!(!is_not_modified(&older, "\"x\"", Some(mtime)));
    }

    #[test]
    fn unparseable_date_is_modified() {
        let h = headers(&[(header::IF_MODIFIED_SINCE, "yesterday")]);
        assert!(!is_not_modified(&h, "\"x\"", Some(SystemTime::now())));
    }

    #[test]
    fn file_etag_is_quoted_and_stable() {
        let t = UNIX_EPOCH + Duration::from_secs(255);
        assert_eq!(file_etag(16, Some(t)), "\"10-ff\"");
        assert_eq!(file_etag(16, None), "\"10-0\"");
    }

    #[test]
    fn page_etag_changes_with_content() {
        assert_ne!(content_etag(b"one"), content_etag(b"two"));
        assert_eq!(content_etag(b"one"), content_etag(b"one"));
    }

    // --- bind_with_retry ---

    #[test]
    fn bind_skips_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        if port == u16::MAX {
            return;
        }
        let (_listener, bound) = bind_with_retry("127.0.0.1", port).unwrap();
        assert_ne!(bound, port);
        assert!(bound > port && bound - port <= MAX_PORT_ATTEMPTS);
    }

    #[test]
    fn bind_invalid_address_fails_without_retry() {
        let err = bind_with_retry("definitely not an address", 3333).unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }));
    }

    // --- symlink containment ---

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_outside_root_fails_containment_check() {
        use std::os::unix::fs::symlink;

        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::NamedTempFile::new().unwrap();
        let link = root.path().join("evil.png");
        symlink(outside.path(), &link).unwrap();

        let canonical_root = std::fs::canonicalize(root.path()).unwrap();
        let canonical_link = tokio::fs::canonicalize(&link).await.unwrap();
        assert!(!contained_in(&canonical_link, &canonical_root));
    }

    #[test]
    fn app_state_prebuilds_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            static_dir: dir.path().to_path_buf(),
            ..SiteConfig::default()
        };
        let state = AppState::new(&config, "footer");
        assert!(state.page.starts_with("<!DOCTYPE html>"));
        assert!(state.page_etag.starts_with('"') && state.page_etag.ends_with('"'));
        assert_eq!(state.canonical_root, std::fs::canonicalize(dir.path()).unwrap());
    }
}
