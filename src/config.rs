use crate::store::DEFAULT_DATA_FILE;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Where the user records live
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_file: PathBuf,
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

/// Log filter and optional log file
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Partial config as read from one file; unset fields leave lower layers alone
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigLayer {
    #[serde(default)]
    store: StoreLayer,
    #[serde(default)]
    logging: LoggingLayer,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct StoreLayer {
    data_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct LoggingLayer {
    level: Option<String>,
    file: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.shelf/config.local.toml) > project (.shelf/config.toml) > user (~/.shelf/config.toml)
    /// Starts with built-in defaults, then merges user/project/local configs
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".shelf").join("config.toml");
            if user_config.exists() {
                config.merge(read_layer(&user_config)?);
            }
        }

        let project_config = Path::new(".shelf").join("config.toml");
        if project_config.exists() {
            config.merge(read_layer(&project_config)?);
        }

        // Should be gitignored
        let local_config = Path::new(".shelf").join("config.local.toml");
        if local_config.exists() {
            config.merge(read_layer(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path, on top of the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge(read_layer(path)?);
        Ok(config)
    }

    /// Merge a layer into this config; fields the layer sets take priority
    fn merge(&mut self, other: ConfigLayer) {
        if let Some(data_file) = other.store.data_file {
            self.store.data_file = data_file;
        }
        if let Some(level) = other.logging.level {
            self.logging.level = level;
        }
        if other.logging.file.is_some() {
            self.logging.file = other.logging.file;
        }
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.store.data_file.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "store.data_file".to_string(),
                message: "Must not be empty".to_string(),
            });
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            errors.push(ValidationError {
                field: "logging.level".to_string(),
                message: format!("Invalid filter '{}': {}", self.logging.level, e),
            });
        }

        if let Some(file) = &self.logging.file {
            if file.as_os_str().is_empty() {
                errors.push(ValidationError {
                    field: "logging.file".to_string(),
                    message: "Must not be empty when set".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn read_layer(path: &Path) -> Result<ConfigLayer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let layer = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(layer)
}
