//! HTTP response building module
//!
//! Builders for the terminal statuses the pipeline can produce. None of
//! these carries a file stream, so terminal branches hold no open handles.

use crate::http::body::{self, ResponseBody};
use crate::http::cache::CacheHeaders;
use hyper::Response;

/// Build 304 Not Modified response.
///
/// Carries the cache headers so the client can refresh its copy's lifetime,
/// but no Content-Type or Content-Length.
pub fn not_modified(cache: &CacheHeaders) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(304)
        .header("Last-Modified", cache.last_modified.as_str())
        .header("Date", cache.date.as_str())
        .header("Expires", cache.expires.as_str())
        .header("Cache-Control", cache.cache_control.as_str());
    if let Some(tag) = &cache.etag {
        builder = builder.header("ETag", tag.as_str());
    }
    builder.body(body::empty()).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(body::empty())
    })
}

/// Build 404 Not Found response
pub fn not_found() -> Response<ResponseBody> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(body::full("404 Not Found"))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(body::empty())
        })
}

/// Build 405 Method Not Allowed response
pub fn method_not_allowed(allow: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", allow)
        .body(body::full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(body::empty())
        })
}

/// Build 400 Bad Request response (path exists but is not a regular file)
pub fn bad_request() -> Response<ResponseBody> {
    Response::builder()
        .status(400)
        .header("Content-Type", "text/plain")
        .body(body::full("400 Bad Request"))
        .unwrap_or_else(|e| {
            log_build_error("400", &e);
            Response::new(body::empty())
        })
}

/// Build 301 redirect to the directory path with a trailing separator
pub fn moved_permanently(location: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(301)
        .header("Location", location)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(body::empty())
        })
}

/// Build 416 Range Not Satisfiable response
pub fn range_not_satisfiable(total_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{total_size}"))
        .body(body::full("Range Not Satisfiable"))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(body::empty())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
