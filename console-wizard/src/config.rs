// Console configuration
//
// Layers, lowest first: built-in defaults, TOML file, `CONSOLE_WIZARD__*` environment variables
// (e.g. `CONSOLE_WIZARD__EXECUTOR__BASE_URL`).

use crate::utils::path_resolver::default_config_file;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/idm/api/v1/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const ENV_PREFIX: &str = "CONSOLE_WIZARD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    pub stdout: bool,
}

impl LoggingSettings {
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown log level '{}'", self.level))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub executor: ExecutorSettings,
    pub logging: LoggingSettings,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                auth_token: None,
            },
            logging: LoggingSettings {
                level: "debug".to_string(),
                directory: None,
                stdout: true,
            },
        }
    }
}

impl ConsoleConfig {
    /// Load the layered configuration. An explicit file must exist; the
    /// default per-user file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (file, required) = match explicit {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (default_config_file(), false),
        };
        Self::load_layers(file.as_deref(), required, true)
    }

    fn load_layers(file: Option<&Path>, required: bool, with_env: bool) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("executor.base_url", defaults.executor.base_url)?
            .set_default("executor.timeout_secs", defaults.executor.timeout_secs as i64)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.stdout", defaults.logging.stdout)?;

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(required));
        }
        if with_env {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let loaded: ConsoleConfig = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read configuration: {}", e))?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.executor.base_url).map_err(|e| {
            anyhow::anyhow!(
                "executor.base_url '{}' is not a valid URL: {}",
                self.executor.base_url,
                e
            )
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(anyhow::anyhow!(
                "executor.base_url must use http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.executor.timeout_secs == 0 {
            return Err(anyhow::anyhow!("executor.timeout_secs must be greater than 0"));
        }
        self.logging.level_filter()?;
        Ok(())
    }

    /// Effective configuration as TOML, with the auth token masked.
    pub fn to_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.executor.auth_token.is_some() {
            shown.executor.auth_token = Some("***".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| anyhow::anyhow!("Failed to render configuration: {}", e))
    }
}
