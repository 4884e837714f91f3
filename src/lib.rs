//! Static file delivery for a hyper-based HTTP server.
//!
//! The crate resolves a request path against a configured root directory,
//! evaluates conditional-cache headers, parses byte ranges, negotiates
//! content encoding, and streams the response body.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
