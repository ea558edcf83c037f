//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cube::DataCube;
use crate::fetcher::{FetcherConfig, RequestMethod};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SPARQL endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    /// "get" or "post"
    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_endpoint_url() -> String {
    "http://localhost:3030/query".to_string()
}

fn default_method() -> String {
    "post".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            method: default_method(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl From<&EndpointConfig> for FetcherConfig {
    fn from(config: &EndpointConfig) -> Self {
        let method = RequestMethod::from_str(&config.method).unwrap_or_else(|| {
            tracing::warn!(method = %config.method, "Unknown request method, using POST");
            RequestMethod::Post
        });
        FetcherConfig {
            endpoint: config.url.clone(),
            method,
            request_timeout_ms: config.request_timeout_secs * 1000,
            max_retries: config.max_retries,
        }
    }
}

/// Defaults applied to every cube
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Preferred label languages, most preferred first
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Named graph to query (`FROM <graph>`)
    pub graph: Option<String>,
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            graph: None,
        }
    }
}

impl QueryConfig {
    /// Apply the configured languages and graph to a cube
    pub fn apply(&self, cube: DataCube) -> DataCube {
        let cube = cube.with_languages(self.languages.iter().cloned());
        match &self.graph {
            Some(graph) => cube.with_graph(graph.clone()),
            None => cube,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("cubequery").join("config.toml")),
            Some(PathBuf::from("/etc/cubequery/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Endpoint overrides
        if let Some(url) = var("CUBEQUERY_ENDPOINT_URL") {
            self.endpoint.url = url;
        }
        if let Some(method) = var("CUBEQUERY_ENDPOINT_METHOD") {
            self.endpoint.method = method;
        }
        if let Some(retries) = var("CUBEQUERY_MAX_RETRIES") {
            if let Ok(n) = retries.parse() {
                self.endpoint.max_retries = n;
            }
        }

        // Query overrides
        if let Some(languages) = var("CUBEQUERY_LANGUAGES") {
            self.query.languages = languages
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(graph) = var("CUBEQUERY_GRAPH") {
            self.query.graph = Some(graph);
        }

        // Logging overrides
        if let Some(level) = var("CUBEQUERY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CUBEQUERY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# cubequery Configuration
#
# Environment variables override these settings:
# - CUBEQUERY_ENDPOINT_URL
# - CUBEQUERY_ENDPOINT_METHOD
# - CUBEQUERY_MAX_RETRIES
# - CUBEQUERY_LANGUAGES (comma separated)
# - CUBEQUERY_GRAPH
# - CUBEQUERY_LOG_LEVEL
# - CUBEQUERY_LOG_FORMAT

[endpoint]
# SPARQL query endpoint
url = "http://localhost:3030/query"

# Request method: get (query in the URL) or post (query in the body)
method = "post"

# Request timeout in seconds
request_timeout_secs = 30

# Attempts per query before giving up
max_retries = 3

[query]
# Label languages, most preferred first
languages = ["en"]

# Named graph holding the cubes
# graph = "https://linked.opendata.swiss/graph/zh/statistics"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint.url, "http://localhost:3030/query");
        assert_eq!(config.endpoint.method, "post");
        assert_eq!(config.query.languages, vec!["en".to_string()]);
        assert!(config.query.graph.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse(&generate_default_config(), Path::new("default.toml")).unwrap();
        assert_eq!(config.endpoint.max_retries, 3);
        assert_eq!(config.endpoint.request_timeout_secs, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[endpoint]
url = "https://ld.stadt-zuerich.ch/query"
method = "get"

[query]
languages = ["de", "en"]
graph = "https://linked.opendata.swiss/graph/zh/statistics"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.endpoint.url, "https://ld.stadt-zuerich.ch/query");
        assert_eq!(config.endpoint.max_retries, 3);
        assert_eq!(config.query.languages, vec!["de", "en"]);
        assert_eq!(config.logging.level, "info");

        let fetcher = FetcherConfig::from(&config.endpoint);
        assert_eq!(fetcher.method, RequestMethod::Get);
        assert_eq!(fetcher.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load(Path::new("/nonexistent/cubequery.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[endpoint\nurl = 1").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CUBEQUERY_ENDPOINT_URL", "http://example.com/sparql"),
            ("CUBEQUERY_LANGUAGES", "de, fr,,it"),
            ("CUBEQUERY_MAX_RETRIES", "five"),
            ("CUBEQUERY_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.endpoint.url, "http://example.com/sparql");
        assert_eq!(config.query.languages, vec!["de", "fr", "it"]);
        assert_eq!(config.endpoint.max_retries, 3);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_query_config_applies_to_cube() {
        use crate::cube::StaticCube;
        use crate::fetcher::SparqlFetcher;
        use std::sync::Arc;

        let fetcher = SparqlFetcher::new(FetcherConfig::default()).unwrap();
        let cube = DataCube::new(
            "http://example.com/cube",
            Arc::new(StaticCube::default()),
            Arc::new(fetcher),
        );
        let config = QueryConfig {
            languages: vec!["de".to_string()],
            graph: Some("http://example.com/graph".to_string()),
        };

        let cube = config.apply(cube);
        assert_eq!(cube.languages(), &["de".to_string()]);
        assert_eq!(cube.graph_iri(), Some("http://example.com/graph"));
    }

    #[test]
    fn test_unknown_method_falls_back_to_post() {
        let endpoint = EndpointConfig {
            method: "put".to_string(),
            ..Default::default()
        };
        assert_eq!(FetcherConfig::from(&endpoint).method, RequestMethod::Post);
    }
}
