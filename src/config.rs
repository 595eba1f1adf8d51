use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const CONFIG_FILE_NAME: &str = "config.json";
pub const ENDPOINT_ENV: &str = "PASSAGE_LENS_ENDPOINT";
pub const TIMEOUT_ENV: &str = "PASSAGE_LENS_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "passage-lens", "passage-lens")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl ExtensionConfig {
    /// Defaults, then the config file, then environment overrides. Not validated:
    /// callers apply their own overrides first and then call [`Self::validate`].
    pub fn load() -> Result<Self, AppError> {
        Self::load_layered(
            default_config_path().as_deref(),
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    pub fn load_layered(
        path: Option<&Path>,
        env_endpoint: Option<String>,
        env_timeout: Option<String>,
    ) -> Result<Self, AppError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        config.apply_overrides(env_endpoint, env_timeout)?;
        Ok(config)
    }

    /// Reads a JSON config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    pub fn apply_overrides(
        &mut self,
        endpoint: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<(), AppError> {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(raw) = timeout_secs.filter(|t| !t.trim().is_empty()) {
            self.request_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("invalid timeout: {raw}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let parsed = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Config(format!("invalid endpoint '{}': {e}", self.endpoint)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "endpoint must be http or https: {}",
                self.endpoint
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config("timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}
