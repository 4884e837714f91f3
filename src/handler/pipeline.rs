//! Request pipeline module
//!
//! Orchestrates path resolution, cache evaluation, range parsing, and body
//! negotiation for a single request, producing either a response or a
//! deferral to the next handler.

use crate::config::StaticOptions;
use crate::handler::resolve::{self, OutsideRouter};
use crate::http::body::{self, ResponseBody};
use crate::http::encoding::{self, EncodingDecision};
use crate::http::range::{self, RangeParse};
use crate::http::{cache, mime, response};
use crate::logger;
use hyper::header::HeaderValue;
use hyper::{Method, Response, StatusCode};
use std::path::Path;
use std::time::SystemTime;

/// Per-request input, extracted from the host request by the caller.
///
/// The pipeline never touches shared mutable state; everything it reads is
/// either here or in the immutable [`StaticOptions`].
pub struct RequestContext<'a> {
    pub method: &'a Method,
    /// Original (undecoded) URI path, used for redirect targets
    pub raw_path: &'a str,
    /// Percent-decoded path matched against the router prefix
    pub decoded_path: &'a str,
    pub is_head: bool,
    pub range: Option<&'a str>,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub accept_encoding: Option<&'a HeaderValue>,
}

/// What the pipeline decided for this request.
///
/// Returning the enum from a single call means every branch signals
/// completion exactly once.
pub enum PipelineOutcome {
    /// Not ours to answer: pass to the next handler. `status` carries a
    /// non-final 405 when the method gate failed.
    Forward { status: Option<StatusCode> },
    /// A finished response, terminal or streaming.
    Respond(Response<ResponseBody>),
}

/// Run the pipeline for one request.
pub async fn run(ctx: &RequestContext<'_>, opts: &StaticOptions) -> PipelineOutcome {
    if !opts.methods.iter().any(|m| m == ctx.method.as_str()) {
        return PipelineOutcome::Forward {
            status: Some(StatusCode::METHOD_NOT_ALLOWED),
        };
    }

    let path = match resolve::resolve(ctx.decoded_path, opts) {
        Ok(p) => p,
        Err(OutsideRouter) => return PipelineOutcome::Forward { status: None },
    };

    // Every filesystem failure collapses to 404 for the client; the real
    // error goes to the log.
    let meta = match tokio::fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) => {
            logger::log_fs_miss(&path, &e);
            return PipelineOutcome::Respond(response::not_found());
        }
    };

    if meta.is_dir() {
        let location = format!("{}/", ctx.raw_path);
        return PipelineOutcome::Respond(response::moved_permanently(&location));
    }
    if !meta.is_file() {
        // Neither file nor directory (socket, device, ...)
        return PipelineOutcome::Respond(response::bad_request());
    }

    PipelineOutcome::Respond(serve_file(ctx, opts, &path, &meta).await)
}

/// Build the response for a resolved regular file.
async fn serve_file(
    ctx: &RequestContext<'_>,
    opts: &StaticOptions,
    path: &Path,
    meta: &std::fs::Metadata,
) -> Response<ResponseBody> {
    let size = meta.len();
    let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    // Cache validity is settled before the Range header is looked at
    let cache_headers = cache::evaluate(size, mtime, opts.cache, opts.etag);
    if let Some(headers) = &cache_headers {
        if cache::is_valid(headers, mtime, ctx.if_none_match, ctx.if_modified_since) {
            return response::not_modified(headers);
        }
    }

    let chosen = match encoding::negotiate(path, ctx.accept_encoding, &opts.zip) {
        EncodingDecision::Selected(enc) => Some(enc),
        EncodingDecision::None | EncodingDecision::Malformed => None,
    };

    let (serve_range, mut builder) = match range::parse(ctx.range, size) {
        RangeParse::Unsatisfiable => return response::range_not_satisfiable(size),
        RangeParse::NoHeader => (None, Response::builder().status(200)),
        RangeParse::Ranges(spec) => {
            let r = spec.first();
            let builder = Response::builder()
                .status(206)
                .header("Accept-Ranges", spec.unit.as_str())
                .header("Content-Range", r.content_range(&spec.unit, size));
            (Some(r), builder)
        }
    };

    builder = builder.header("Content-Type", mime::content_type_for(path));
    if let Some(headers) = &cache_headers {
        builder = builder
            .header("Last-Modified", headers.last_modified.as_str())
            .header("Date", headers.date.as_str())
            .header("Expires", headers.expires.as_str())
            .header("Cache-Control", headers.cache_control.as_str());
        if let Some(tag) = &headers.etag {
            builder = builder.header("ETag", tag.as_str());
        }
    }
    builder = match chosen {
        // Compressed length is unknown up front, so the response is chunked
        // and carries no Content-Length
        Some(enc) => builder
            .header("Content-Encoding", enc.token())
            .header("Transfer-Encoding", "chunked"),
        None => builder.header(
            "Content-Length",
            serve_range.map_or(size, |r| r.byte_len()),
        ),
    };

    let body = if ctx.is_head {
        body::empty()
    } else {
        match body::open_read(path, serve_range, chosen).await {
            Ok(b) => b,
            Err(e) => {
                // File vanished between stat and open
                logger::log_fs_miss(path, &e);
                return response::not_found();
            }
        }
    };

    builder.body(body).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build file response: {e}"));
        Response::new(body::empty())
    })
}
