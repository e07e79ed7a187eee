//! Static content serving with history-API fallback.
//!
//! # Responsibilities
//! - Serve files from the content base, stripping the public path prefix
//! - Fall back to `index.html` for client-side routes
//! - Inject the live-reload client into served HTML
//!
//! # Design Decisions
//! - Fallback only after the file lookup returned 404
//! - Fallback requires GET/HEAD and an `Accept` of `text/html` or `*/*`
//! - HEAD on HTML reports the length the injected GET body would have

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::http::dev_config::{DevServerConfig, HistoryFallback};
use crate::http::livereload::CLIENT_SCRIPT_PATH;

/// Largest HTML document buffered for script injection.
const MAX_HTML_BYTES: usize = 16 * 1024 * 1024;

/// Serve `request` from the content base.
pub async fn serve(config: &DevServerConfig, files: &ServeDir, mut request: Request<Body>) -> Response {
    if let Some(stripped) = strip_public_path(request.uri(), &config.public_path) {
        *request.uri_mut() = stripped;
    }

    let method = request.method().clone();
    let headers = request.headers().clone();
    let fallback_eligible = accepts_fallback(&method, &headers, request.uri().path(), config.history_api_fallback);

    let mut response = serve_file(files, request).await;

    if response.status() == StatusCode::NOT_FOUND && fallback_eligible {
        tracing::debug!("History fallback to /index.html");
        let mut index = Request::new(Body::empty());
        *index.method_mut() = method.clone();
        *index.headers_mut() = headers;
        *index.uri_mut() = Uri::from_static("/index.html");
        response = serve_file(files, index).await;
    }

    if !config.hot {
        return response;
    }
    if method == Method::GET {
        inject_client(response).await
    } else if method == Method::HEAD {
        adjust_head_length(response)
    } else {
        response
    }
}

async fn serve_file(files: &ServeDir, request: Request<Body>) -> Response {
    match files.clone().oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Remove the public path prefix, keeping the query string.
fn strip_public_path(uri: &Uri, public_path: &str) -> Option<Uri> {
    if public_path == "/" {
        return None;
    }
    let rest = uri.path().strip_prefix(public_path.trim_end_matches('/'))?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let path = if rest.is_empty() { "/" } else { rest };
    let rewritten = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };
    rewritten.parse().ok()
}

/// Whether a request may be answered with `index.html`.
pub fn accepts_fallback(method: &Method, headers: &HeaderMap, path: &str, rules: HistoryFallback) -> bool {
    if method != Method::GET && method != Method::HEAD {
        return false;
    }

    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html") || accept.contains("*/*"))
        .unwrap_or(false);
    if !accepts_html {
        return false;
    }

    if !rules.disable_dot_rule {
        let last_segment = path.rsplit('/').next().unwrap_or("");
        if last_segment.contains('.') {
            return false;
        }
    }
    true
}

fn is_injectable(response: &Response) -> bool {
    response.status() == StatusCode::OK
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(false)
}

async fn inject_client(response: Response) -> Response {
    if !is_injectable(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_HTML_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer HTML for live reload");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

/// Grow `Content-Length` by the client tag; drop it when it cannot be read.
fn adjust_head_length(mut response: Response) -> Response {
    if !is_injectable(&response) {
        return response;
    }

    let headers = response.headers_mut();
    let length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    match length {
        Some(length) => {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length + client_tag().len()));
        }
        None => {
            headers.remove(header::CONTENT_LENGTH);
        }
    }
    response
}

fn client_tag() -> String {
    format!("<script src=\"{}\"></script>", CLIENT_SCRIPT_PATH)
}

/// Insert the live-reload client tag before the closing body tag.
pub fn inject_script(html: &str) -> String {
    let tag = client_tag();
    match html.rfind("</body>") {
        Some(idx) => format!("{}{}{}", &html[..idx], tag, &html[idx..]),
        None => format!("{}{}", html, tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPA: HistoryFallback = HistoryFallback { disable_dot_rule: true };
    const STRICT: HistoryFallback = HistoryFallback { disable_dot_rule: false };

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_fallback_requires_html_accept() {
        assert!(accepts_fallback(&Method::GET, &accept("text/html,application/xhtml+xml"), "/users/1", SPA));
        assert!(accepts_fallback(&Method::HEAD, &accept("*/*"), "/users/1", SPA));
        assert!(!accepts_fallback(&Method::GET, &accept("application/json"), "/users/1", SPA));
        assert!(!accepts_fallback(&Method::GET, &HeaderMap::new(), "/users/1", SPA));
        assert!(!accepts_fallback(&Method::POST, &accept("text/html"), "/users/1", SPA));
    }

    #[test]
    fn test_dot_rule() {
        assert!(accepts_fallback(&Method::GET, &accept("text/html"), "/v1.2/page", SPA));
        assert!(accepts_fallback(&Method::GET, &accept("text/html"), "/report.pdf", SPA));
        assert!(!accepts_fallback(&Method::GET, &accept("text/html"), "/report.pdf", STRICT));
        assert!(accepts_fallback(&Method::GET, &accept("text/html"), "/v1.2/page", STRICT));
    }

    #[test]
    fn test_strip_public_path() {
        let uri: Uri = "/assets/app.js?v=3".parse().unwrap();
        assert_eq!(strip_public_path(&uri, "/assets/").unwrap(), "/app.js?v=3");

        let uri: Uri = "/assets".parse().unwrap();
        assert_eq!(strip_public_path(&uri, "/assets/").unwrap(), "/");

        let uri: Uri = "/assetsx/app.js".parse().unwrap();
        assert!(strip_public_path(&uri, "/assets/").is_none());

        let uri: Uri = "/app.js".parse().unwrap();
        assert!(strip_public_path(&uri, "/").is_none());
    }

    fn html_head(length: &'static str) -> Response {
        let mut response = Response::new(Body::empty());
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static(length));
        response
    }

    #[test]
    fn test_head_length_matches_injected_body() {
        let response = adjust_head_length(html_head("50"));
        let expected = 50 + inject_script("").len();
        assert_eq!(response.headers()[header::CONTENT_LENGTH], expected.to_string().as_str());

        let response = adjust_head_length(html_head("unknown"));
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());

        let mut css = html_head("50");
        css.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/css"));
        let response = adjust_head_length(css);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "50");
    }

    #[test]
    fn test_inject_script() {
        let html = inject_script("<html><body><div id=\"root\"></div></body></html>");
        assert_eq!(
            html,
            "<html><body><div id=\"root\"></div><script src=\"/__devserve/client.js\"></script></body></html>"
        );

        let fragment = inject_script("<p>hi</p>");
        assert!(fragment.ends_with("<script src=\"/__devserve/client.js\"></script>"));
    }
}
