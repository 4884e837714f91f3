//! MIME type detection module
//!
//! Maps file extensions to media types and media types to charsets.

use std::path::Path;

/// Look up the media type for a path by its extension
///
/// # Examples
/// ```
/// use std::path::Path;
/// use rustatic::http::mime::lookup_type;
/// assert_eq!(lookup_type(Path::new("a.html")), Some("text/html"));
/// assert_eq!(lookup_type(Path::new("a.bin")), None);
/// ```
pub fn lookup_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" | "md" => "text/plain",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(mime)
}

/// Look up the default charset for a media type
pub fn lookup_charset(mime: &str) -> Option<&'static str> {
    if mime.starts_with("text/") {
        return Some("UTF-8");
    }
    match mime {
        "application/json" | "application/javascript" => Some("UTF-8"),
        _ => None,
    }
}

/// Full Content-Type header value for a path, lower-cased, with charset when
/// known. Unknown extensions fall back to `application/octet-stream`.
pub fn content_type_for(path: &Path) -> String {
    let mime = lookup_type(path).unwrap_or("application/octet-stream");
    match lookup_charset(mime) {
        Some(charset) => format!("{mime}; charset={charset}").to_lowercase(),
        None => mime.to_ascii_lowercase(),
    }
}
