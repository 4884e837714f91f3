// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub static_files: StaticFilesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Static file serving configuration as written in the config file.
///
/// Sealed into an immutable [`StaticOptions`] at startup; request handling
/// never reads this struct directly.
#[derive(Debug, Deserialize, Clone)]
pub struct StaticFilesConfig {
    /// Route prefix the handler claims; requests outside it are forwarded
    #[serde(default)]
    pub router: String,
    /// Root directory files are served from
    #[serde(default = "default_root")]
    pub root: String,
    /// File served when a request path ends in a slash
    #[serde(default = "default_index")]
    pub index: String,
    /// HTTP methods the handler accepts
    #[serde(default = "default_methods")]
    pub method: Vec<String>,
    /// Compression policy: off, default encodings, or an explicit list
    #[serde(default)]
    pub zip: ZipPolicy,
    /// Cache policy: off, default duration, or a duration in seconds
    #[serde(default)]
    pub cache: CacheOption,
    /// Emit an entity tag derived from file size and mtime
    #[serde(default)]
    pub etag: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_root() -> String {
    ".".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_index() -> String {
    "index.html".to_string()
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string(), "HEAD".to_string()]
}

/// Compression policy value: `false`, `true`, a single encoding name, or a
/// list of encoding names.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ZipPolicy {
    Enabled(bool),
    Single(String),
    List(Vec<String>),
}

impl Default for ZipPolicy {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Cache policy value: `false`, `true` (default duration), or a duration in
/// seconds.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum CacheOption {
    Enabled(bool),
    Seconds(u64),
}

impl Default for CacheOption {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Immutable per-pipeline view of the static file options.
///
/// `root` is absolute and normalized exactly once, at construction; the
/// router prefix has trailing slashes stripped. Shared read-only across all
/// requests for the lifetime of the pipeline.
#[derive(Debug, Clone)]
pub struct StaticOptions {
    pub router: String,
    pub root: PathBuf,
    pub index: String,
    pub methods: Vec<String>,
    pub zip: ZipPolicy,
    pub cache: CacheOption,
    pub etag: bool,
}

impl StaticFilesConfig {
    /// Seal the raw config into runtime options.
    ///
    /// Fails only when the current directory is needed to absolutize a
    /// relative root and cannot be read.
    pub fn seal(&self) -> std::io::Result<StaticOptions> {
        let root = Path::new(&self.root);
        let root = if root.is_absolute() {
            normalize(root)
        } else {
            normalize(&std::env::current_dir()?.join(root))
        };

        Ok(StaticOptions {
            router: self.router.trim_end_matches('/').to_string(),
            root,
            index: self.index.clone(),
            methods: self.method.iter().map(|m| m.to_ascii_uppercase()).collect(),
            zip: self.zip.clone(),
            cache: self.cache,
            etag: self.etag,
        })
    }
}

/// Lexically normalize an absolute path: drop `.` segments, resolve `..`
/// without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}
