//! Request handling module
//!
//! Adapts hyper requests to the pipeline's explicit per-request context and
//! turns pipeline outcomes into wire responses.

pub mod pipeline;
pub mod resolve;

use crate::config::AppState;
use crate::http::body::ResponseBody;
use crate::http::response;
use crate::logger::{self, AccessLogEntry};
use hyper::{Method, Request, Response, Version};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use pipeline::{PipelineOutcome, RequestContext};

/// Main entry point for HTTP request handling.
///
/// This binary mounts the static pipeline as its only handler, so both
/// deferral outcomes bottom out here: a routing miss becomes 404 and a
/// method-gate failure becomes the 405 it carried.
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let raw_path = req.uri().path();

    let decoded = match percent_decode_str(raw_path).decode_utf8() {
        Ok(d) => d.into_owned(),
        Err(_) => {
            let resp = response::bad_request();
            log_access(&req, peer_addr, &state, &resp);
            return Ok(resp);
        }
    };

    let headers = req.headers();
    let ctx = RequestContext {
        method: req.method(),
        raw_path,
        decoded_path: &decoded,
        is_head: *req.method() == Method::HEAD,
        range: headers.get("range").and_then(|v| v.to_str().ok()),
        if_none_match: headers.get("if-none-match").and_then(|v| v.to_str().ok()),
        if_modified_since: headers
            .get("if-modified-since")
            .and_then(|v| v.to_str().ok()),
        accept_encoding: headers.get("accept-encoding"),
    };

    let resp = match pipeline::run(&ctx, &state.statics).await {
        PipelineOutcome::Respond(resp) => resp,
        PipelineOutcome::Forward { status: Some(_) } => {
            response::method_not_allowed(&state.statics.methods.join(", "))
        }
        PipelineOutcome::Forward { status: None } => response::not_found(),
    };

    log_access(&req, peer_addr, &state, &resp);
    Ok(resp)
}

fn log_access(
    req: &Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: &AppState,
    resp: &Response<ResponseBody>,
) {
    if !state.config.logging.access_log {
        return;
    }

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0".to_string(),
        Version::HTTP_2 => "2".to_string(),
        _ => "1.1".to_string(),
    };
    entry.status = resp.status().as_u16();
    entry.body_bytes = resp
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.referer = req
        .headers()
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}
