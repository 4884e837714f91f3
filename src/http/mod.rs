//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by the request pipeline: MIME
//! lookup, cache-header evaluation, Range parsing, content-encoding
//! negotiation, body streaming, and response builders.

pub mod body;
pub mod cache;
pub mod encoding;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use encoding::EncodingDecision;
pub use range::RangeParse;
