//! Configuration loading and config file resolution
//!
//! Every key has a compiled default, so a missing config file still yields a
//! runnable service. Secrets are never expected in the TOML file; they are
//! read from the environment by [`TomlConfig::apply_env_overrides`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CMSYNC_CONFIG";
/// Environment variable carrying the CMS API token
pub const CMS_TOKEN_ENV_VAR: &str = "CMSYNC_CMS_TOKEN";
/// Environment variable carrying the aggregation engine endpoint
pub const AGGREGATION_URL_ENV_VAR: &str = "CMSYNC_AGGREGATION_URL";

/// Top-level configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cms: CmsConfig,
    pub images: ImageConfig,
    pub aggregation: AggregationConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:5730`
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5730".to_string(),
        }
    }
}

/// Document store settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file; defaults to the platform data directory
    pub path: Option<PathBuf>,
    /// Keep documents in process memory instead of SQLite
    pub in_memory: bool,
}

impl DatabaseConfig {
    /// Database file path, falling back to the OS-dependent default
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_database_path)
    }
}

/// Content management source settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CmsConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    /// Query the CDN edge instead of the live API
    pub use_cdn: bool,
    /// Bearer token; normally supplied through `CMSYNC_CMS_TOKEN`
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            project_id: "9cb050q1".to_string(),
            dataset: "production".to_string(),
            api_version: "2022-11-29".to_string(),
            use_cdn: false,
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Image CDN settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageConfig {
    pub base_url: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.sanity.io".to_string(),
        }
    }
}

/// Popular-times aggregation engine settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Endpoint computing popular times; aggregation is disabled when unset
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 60,
        }
    }
}

/// Batch synchronization settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on records processed concurrently by one batch
    pub max_concurrency: usize,
    /// Popular times older than this many whole days are refreshed
    pub stale_after_days: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            stale_after_days: 6,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a file
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// used. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Overlay secrets and endpoints taken from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = non_empty_env(CMS_TOKEN_ENV_VAR) {
            self.cms.token = Some(token);
        }
        if let Some(url) = non_empty_env(AGGREGATION_URL_ENV_VAR) {
            self.aggregation.url = Some(url);
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sync.max_concurrency == 0 {
            return Err(Error::Config(
                "sync.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.sync.stale_after_days < 0 {
            return Err(Error::Config(
                "sync.stale_after_days must not be negative".to_string(),
            ));
        }
        if self.cms.project_id.trim().is_empty() || self.cms.dataset.trim().is_empty() {
            return Err(Error::Config(
                "cms.project_id and cms.dataset are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read, in priority order:
/// 1. Command-line argument
/// 2. `CMSYNC_CONFIG` environment variable
/// 3. `<user config dir>/cmsync/config.toml`, if it exists
///
/// Returns `None` when no candidate applies; callers then use defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = non_empty_env(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("cmsync").join("config.toml"))
        .filter(|p| p.exists())
}

/// Resolve, load, overlay environment and validate in one step
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) => TomlConfig::load(&path)?,
        None => {
            info!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Get OS-dependent default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cmsync")
        .join("cmsync.db")
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
