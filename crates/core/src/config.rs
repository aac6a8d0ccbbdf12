//! Configuration management for the Nexus client.
//!
//! This module handles loading and merging configuration from multiple sources,
//! lowest precedence first:
//! - Built-in defaults
//! - Config file (`.nexus/config.yaml` or `NEXUS_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The backend endpoint is always injected from here; nothing else in the
//! workspace hardcodes a host or port.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default RAG backend endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Default per-request deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// client behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the RAG backend (scheme, host and port)
    pub endpoint: String,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Deadline applied to every backend call
    pub timeout_secs: u64,

    /// Number of passages the backend should retrieve per query
    pub top_k: Option<u32>,

    /// Whether the backend should rerank results using the follow graph
    pub use_graph_ranking: Option<bool>,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    backend: Option<BackendConfig>,
    query: Option<QueryConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BackendConfig {
    endpoint: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueryConfig {
    #[serde(rename = "topK")]
    top_k: Option<u32>,
    #[serde(rename = "useGraphRanking")]
    use_graph_ranking: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            config_file: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            top_k: None,
            use_graph_ranking: None,
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// `config_file` takes precedence over `NEXUS_CONFIG`; without either,
    /// `.nexus/config.yaml` in the current directory is used when present.
    ///
    /// Environment variables:
    /// - `NEXUS_CONFIG`: Path to config file
    /// - `NEXUS_ENDPOINT`: Backend base URL
    /// - `NEXUS_TIMEOUT_SECS`: Per-request deadline
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use nexus_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Backend: {}", config.endpoint);
    /// ```
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        config.config_file =
            config_file.or_else(|| std::env::var("NEXUS_CONFIG").ok().map(PathBuf::from));

        // An explicitly named file must exist; the default one is optional
        let config_path = match config.config_file {
            Some(ref cf) => {
                if !cf.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        cf
                    )));
                }
                Some(cf.clone())
            }
            None => {
                let default_path = PathBuf::from(".nexus/config.yaml");
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_path {
            config = config.merge_yaml(&path)?;
        }

        // Environment variables override YAML config
        if let Ok(endpoint) = std::env::var("NEXUS_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("NEXUS_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|e| {
                AppError::Config(format!("Invalid NEXUS_TIMEOUT_SECS {:?}: {}", timeout, e))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        // Check for NO_COLOR environment variable
        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(backend) = config_file.backend {
            if let Some(endpoint) = backend.endpoint {
                result.endpoint = endpoint;
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                result.timeout_secs = timeout_secs;
            }
        }

        if let Some(query) = config_file.query {
            if query.top_k.is_some() {
                result.top_k = query.top_k;
            }
            if query.use_graph_ranking.is_some() {
                result.use_graph_ranking = query.use_graph_ranking;
            }
        }

        // Merge logging settings
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        timeout_secs: Option<u64>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }

        if let Some(timeout_secs) = timeout_secs {
            self.timeout_secs = timeout_secs;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Deadline applied to each backend call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate configuration before any request is issued.
    pub fn validate(&self) -> AppResult<()> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Unsupported endpoint: {}. Expected an http:// or https:// URL",
                self.endpoint
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "Request timeout must be at least one second".to_string(),
            ));
        }

        if self.top_k == Some(0) {
            return Err(AppError::Config("topK must be greater than zero".to_string()));
        }

        Ok(())
    }
}
