//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `ASKSPHERE_*` environment variables.
//! Component-level tuning (thresholds, timeouts, escalation) lives with each
//! component: see [`crate::toxicity::ToxicityConfig`],
//! [`crate::relevance::RelevanceConfig`], [`crate::embedding::EmbedderConfig`]
//! and [`crate::gate::EscalationPolicy`].

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `ASKSPHERE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Sentence-embedding model directory (`config.json`, `model.safetensors`,
    /// `tokenizer.json`). Stub embedder when unset.
    pub embedding_model_path: Option<PathBuf>,

    /// Toxicity classifier directory (same layout). Stub classifier when unset.
    pub toxicity_model_path: Option<PathBuf>,

    /// Ledger snapshot file. In-memory only when unset.
    pub ledger_path: Option<PathBuf>,

    /// Community/question seed JSON for the in-memory stores.
    pub seed_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            embedding_model_path: None,
            toxicity_model_path: None,
            ledger_path: None,
            seed_path: None,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "ASKSPHERE_PORT";
    const ENV_BIND_ADDR: &'static str = "ASKSPHERE_BIND_ADDR";
    const ENV_EMBEDDING_MODEL_PATH: &'static str = "ASKSPHERE_EMBEDDING_MODEL_PATH";
    const ENV_TOXICITY_MODEL_PATH: &'static str = "ASKSPHERE_TOXICITY_MODEL_PATH";
    const ENV_LEDGER_PATH: &'static str = "ASKSPHERE_LEDGER_PATH";
    const ENV_SEED_PATH: &'static str = "ASKSPHERE_SEED_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;

        Ok(Self {
            port,
            bind_addr,
            embedding_model_path: optional_path_from_env(Self::ENV_EMBEDDING_MODEL_PATH),
            toxicity_model_path: optional_path_from_env(Self::ENV_TOXICITY_MODEL_PATH),
            ledger_path: optional_path_from_env(Self::ENV_LEDGER_PATH),
            seed_path: optional_path_from_env(Self::ENV_SEED_PATH),
        })
    }

    /// Validates paths (does not create anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.embedding_model_path, &self.toxicity_model_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.seed_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if let Some(ref path) = self.ledger_path {
            if path.is_dir() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.is_dir()
            {
                return Err(ConfigError::NotADirectory {
                    path: parent.to_path_buf(),
                });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }
}

/// Reads a trimmed, non-empty path from `var_name`.
pub(crate) fn optional_path_from_env(var_name: &str) -> Option<PathBuf> {
    env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Parses `var_name`, falling back to `default` when unset or unparsable.
pub(crate) fn parse_or_default<T: FromStr>(var_name: &str, default: T) -> T {
    env::var(var_name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads a duration given in whole seconds.
pub(crate) fn secs_from_env(var_name: &str, default: Duration) -> Duration {
    env::var(var_name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Reads a boolean flag (`1`/`true`/`yes` enable it).
pub(crate) fn flag_from_env(var_name: &str) -> bool {
    env::var(var_name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Checks that a threshold lies in `range`.
pub(crate) fn check_threshold(
    name: &'static str,
    value: f32,
    range: std::ops::RangeInclusive<f32>,
) -> Result<(), ConfigError> {
    if value.is_nan() || !range.contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(())
}
