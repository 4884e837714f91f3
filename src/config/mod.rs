// Configuration module entry point
// Loads the config file, applies defaults, and seals runtime state

mod types;

use std::net::SocketAddr;

// Re-export public types
pub use types::{
    CacheOption, Config, LoggingConfig, PerformanceConfig, ServerConfig, StaticFilesConfig,
    StaticOptions, ZipPolicy,
};

impl Config {
    /// Load configuration from the specified file path (without extension).
    /// Default config file is "config.toml" when no path is specified.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("RUSTATIC"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("static_files.root", ".")?
            .set_default("static_files.index", "index.html")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Application state shared across connections.
///
/// The static file options are sealed once here; request handling only ever
/// sees this read-only view.
pub struct AppState {
    pub config: Config,
    pub statics: StaticOptions,
}

impl AppState {
    pub fn new(config: Config) -> std::io::Result<Self> {
        let statics = config.static_files.seal()?;
        Ok(Self { config, statics })
    }
}
