//! Response construction: media types, development cache headers, and the
//! plain-text failure bodies.
//!
//! Error bodies are always `text/plain`. An HTML error under a script URL
//! would be cached by the browser as a module and keep failing after the
//! underlying problem is fixed.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use std::path::Path;

/// Media type for a served file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("ui") | Some("uix") | Some("ts") | Some("tsx") | Some("js") | Some("jsx")
        | Some("mjs") => "application/javascript; charset=utf-8",
        Some("css") | Some("scss") | Some("sass") => "text/css",
        Some("json") | Some("map") => "application/json",
        Some("html") => "text/html; charset=utf-8",
        Some("wasm") => "application/wasm",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        _ => "application/octet-stream",
    }
}

/// 200 response with development cache headers and an explicit length.
pub fn ok_response(content_type: &str, body: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body.len())
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(Body::from(body))
        .unwrap()
}

/// 200 script response.
pub fn script_response(body: String) -> Response {
    ok_response("application/javascript; charset=utf-8", body.into_bytes())
}

/// 404 with a `text/plain` body. Never HTML.
pub fn not_found(url: &str) -> Response {
    let body = format!("File not found: {url}");
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

/// 500 with a `text/plain` body. Never HTML.
pub fn server_error(message: String) -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::CONTENT_LENGTH, message.len())
        .body(Body::from(message))
        .unwrap()
}

/// 302 redirect.
pub fn redirect(location: &str) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .header(header::CONTENT_LENGTH, 0)
        .body(Body::empty())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_extensions_share_media_type() {
        for ext in ["ui", "uix", "ts", "js", "mjs"] {
            assert_eq!(
                content_type_for(Path::new(&format!("/a/x.{ext}"))),
                "application/javascript; charset=utf-8"
            );
        }
    }

    #[test]
    fn other_media_types() {
        assert_eq!(content_type_for(Path::new("/a/x.css")), "text/css");
        assert_eq!(content_type_for(Path::new("/a/x.png")), "image/png");
        assert_eq!(content_type_for(Path::new("/a/x.svg")), "image/svg+xml");
        assert_eq!(
            content_type_for(Path::new("/a/unknown.bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn dev_headers_forbid_caching() {
        let response = ok_response("text/css", b"body {}".to_vec());
        let headers = response.headers();
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
        assert_eq!(headers.get(header::CONTENT_LENGTH).unwrap(), "7");
    }

    #[test]
    fn failures_are_plain_text() {
        let nf = not_found("/src/missing.ui");
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);
        assert_eq!(nf.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");

        let err = server_error("boom".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }
}
