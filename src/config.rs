//! Server configuration
//!
//! Loaded once at startup from a YAML file. `STOCKROOM_PORT` and
//! `STOCKROOM_DATA_PATH` override the corresponding file values.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Config file used when neither the command line nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "stockroom.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The handler a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Echo,
    Static,
    Health,
    Sleep,
    Api,
}

impl HandlerKind {
    /// Health and Sleep answer a single path; the rest own a subtree.
    pub fn default_match(self) -> MatchMode {
        match self {
            HandlerKind::Health | HandlerKind::Sleep => MatchMode::Exact,
            HandlerKind::Echo | HandlerKind::Static | HandlerKind::Api => MatchMode::Prefix,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    Prefix,
}

/// One entry of the `routes` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub path: String,
    pub handler: HandlerKind,
    /// Directory served by a static route
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Overrides the handler's default match rule
    #[serde(default, rename = "match")]
    pub match_mode: Option<MatchMode>,
}

impl RouteConfig {
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
            .unwrap_or_else(|| self.handler.default_match())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// TCP port to listen on; 0 picks an ephemeral port
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Root directory of the entity store
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How long a connection may sit between requests
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// How long a started request may take to arrive in full
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Delay applied by the sleep handler
    #[serde(default = "default_sleep_secs")]
    pub sleep_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    pub routes: Vec<RouteConfig>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./database")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_ms() -> u64 {
    2_000
}

fn default_sleep_secs() -> u64 {
    5
}

fn default_max_connections() -> usize {
    1024
}

impl Config {
    /// Picks the config file: the first command line argument, then
    /// `STOCKROOM_CONFIG`, then [`DEFAULT_CONFIG_PATH`].
    pub fn resolve_path(cli_arg: Option<String>) -> PathBuf {
        cli_arg
            .or_else(|| std::env::var("STOCKROOM_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
            .into()
    }

    /// Reads, parses and validates the file at `path`, applying
    /// environment overrides on the way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut cfg: Config = serde_yaml::from_str(&text)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parses and validates YAML without consulting the environment.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = std::env::var("STOCKROOM_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("STOCKROOM_PORT is not a port: {port:?}")))?;
        }
        if let Ok(data_path) = std::env::var("STOCKROOM_DATA_PATH") {
            self.data_path = PathBuf::from(data_path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routes.is_empty() {
            return Err(ConfigError::Invalid("no routes configured".into()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "route path must start with '/': {:?}",
                    route.path
                )));
            }
            if !seen.insert(route.path.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate route path: {:?}",
                    route.path
                )));
            }
            if route.handler == HandlerKind::Static && route.root.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "static route {:?} requires a root",
                    route.path
                )));
            }
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sleep_duration(&self) -> Duration {
        Duration::from_secs(self.sleep_secs)
    }
}
