use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::ExpansionLimits;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub explore: ExploreConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Dataset location and logging
#[derive(Debug, Clone, Deserialize)]
pub struct ExploreConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Graph expansion thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub max_entities: usize,
    pub quality_floor: usize,
    pub early_floor: usize,
    pub wide_queue_limit: usize,
    /// 0 disables the build deadline
    pub build_timeout_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        let limits = ExpansionLimits::default();
        Self {
            max_entities: limits.max_entities,
            quality_floor: limits.quality_floor,
            early_floor: limits.early_floor,
            wide_queue_limit: limits.wide_queue_limit,
            build_timeout_ms: 0,
        }
    }
}

impl GraphConfig {
    pub fn limits(&self) -> ExpansionLimits {
        ExpansionLimits {
            max_entities: self.max_entities,
            quality_floor: self.quality_floor,
            early_floor: self.early_floor,
            wide_queue_limit: self.wide_queue_limit,
            timeout: (self.build_timeout_ms > 0).then(|| Duration::from_millis(self.build_timeout_ms)),
        }
    }
}

/// Autocomplete configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    pub limit: usize,
    pub cache_capacity: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            cache_capacity: 256,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) first.
    /// The file is `EXPLOREWIKI_CONFIG` if set, otherwise ./config.toml.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("EXPLOREWIKI_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::parse(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration text
    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let graph = &self.graph;
        if graph.max_entities == 0 {
            anyhow::bail!("graph.max_entities must be greater than 0");
        }
        if graph.quality_floor > graph.max_entities {
            anyhow::bail!(
                "graph.quality_floor ({}) must not exceed graph.max_entities ({})",
                graph.quality_floor,
                graph.max_entities
            );
        }
        if graph.early_floor > graph.max_entities {
            anyhow::bail!("graph.early_floor must not exceed graph.max_entities");
        }
        if self.suggest.limit == 0 {
            anyhow::bail!("suggest.limit must be greater than 0");
        }
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.explore.db_path
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.explore.migrations_dir
    }
}
