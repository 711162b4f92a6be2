//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `herald.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use herald_domain::catalog::EventSchema;
use herald_domain::template::RenderGlobals;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Values exposed to templates as `app.*` and `event.date`/`event.time`.
    pub app: AppConfig,
    /// Event processing settings.
    pub engine: EngineConfig,
    /// Event types registered on top of the built-in catalog.
    pub events: Vec<EventSchema>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    pub max_connections: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub url: String,
    /// `strftime` format of `{{event.date}}`.
    pub date_format: String,
    /// `strftime` format of `{{event.time}}`.
    pub time_format: String,
}

/// Queue, pool and timeout settings of the rule engine.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Events buffered between `emit` and the worker pool.
    pub queue_capacity: usize,
    /// Events processed at the same time.
    pub max_concurrency: usize,
    /// Upper bound on a single sender call.
    pub send_timeout_secs: u64,
    /// How long shutdown waits for in-flight events.
    pub shutdown_grace_secs: u64,
}

impl Config {
    /// Load configuration from `herald.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("herald.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("HERALD_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("HERALD_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("HERALD_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("HERALD_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("HERALD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("HERALD_APP_NAME") {
            self.app.name = val;
        }
        if let Some(val) = var("HERALD_APP_URL") {
            self.app.url = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "engine.queue_capacity must be non-zero".to_string(),
            ));
        }
        if self.engine.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "engine.max_concurrency must be non-zero".to_string(),
            ));
        }
        if self.engine.send_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "engine.send_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Globals handed to the template renderer.
    #[must_use]
    pub fn render_globals(&self) -> RenderGlobals {
        RenderGlobals {
            app_name: self.app.name.clone(),
            app_url: self.app.url.clone(),
            date_format: self.app.date_format.clone(),
            time_format: self.app.time_format.clone(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:herald.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "heraldd=info,herald=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let globals = RenderGlobals::default();
        Self {
            name: globals.app_name,
            url: globals.app_url,
            date_format: globals.date_format,
            time_format: globals.time_format,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_concurrency: 8,
            send_timeout_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
