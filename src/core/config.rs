//! Configuration management for the toolbox server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults.

use super::transport::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

const MIB: u64 = 1024 * 1024;

/// Main configuration structure for the toolbox server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP listener configuration.
    pub transport: HttpConfig,

    /// Tool source directory configuration.
    pub plugins: PluginsConfig,

    /// Upload staging and size limits.
    pub uploads: UploadsConfig,

    /// Catalog language settings.
    pub locale: LocaleConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported by the health endpoint.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Where tool directories are discovered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Root directory holding one subdirectory per tool.
    pub root_dir: PathBuf,
}

/// Upload staging area and limits applied by the upload disciplines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Directory uploads are staged in while a capability runs.
    pub staging_dir: PathBuf,

    /// Size cap for the single-image discipline.
    pub max_image_bytes: u64,

    /// Size cap for the single-document discipline and per file for multi-file uploads.
    pub max_document_bytes: u64,

    /// System-wide ceiling on files per multi-file request.
    pub max_files: usize,
}

/// Catalog language settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Language used when the request names none or an unsupported one.
    pub default_lang: String,

    /// Languages clients may request. Empty accepts any language.
    pub languages: Vec<String>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("plugins"),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir().join("toolbox-staging"),
            max_image_bytes: 50 * MIB,
            max_document_bytes: 100 * MIB,
            max_files: 20,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_lang: "en".to_string(),
            languages: vec!["en".to_string(), "zh".to_string(), "es".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "toolbox-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: HttpConfig::default(),
            plugins: PluginsConfig::default(),
            uploads: UploadsConfig::default(),
            locale: LocaleConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `TOOLBOX_`.
    /// For example: `TOOLBOX_PLUGINS_DIR`, `TOOLBOX_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("TOOLBOX_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("TOOLBOX_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = HttpConfig::from_env();

        if let Ok(dir) = std::env::var("TOOLBOX_PLUGINS_DIR") {
            config.plugins.root_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("TOOLBOX_STAGING_DIR") {
            config.uploads.staging_dir = PathBuf::from(dir);
        }

        if let Some(bytes) = parse_var("TOOLBOX_MAX_IMAGE_BYTES") {
            config.uploads.max_image_bytes = bytes;
        }

        if let Some(bytes) = parse_var("TOOLBOX_MAX_DOCUMENT_BYTES") {
            config.uploads.max_document_bytes = bytes;
        }

        if let Some(files) = parse_var("TOOLBOX_MAX_FILES") {
            config.uploads.max_files = files;
        }

        if let Ok(lang) = std::env::var("TOOLBOX_DEFAULT_LANG") {
            config.locale.default_lang = lang.trim().to_ascii_lowercase();
        }

        if let Ok(languages) = std::env::var("TOOLBOX_LANGUAGES") {
            config.locale.languages = languages
                .split(',')
                .map(|l| l.trim().to_ascii_lowercase())
                .filter(|l| !l.is_empty())
                .collect();
            info!("Supported languages: {:?}", config.locale.languages);
        }

        config
    }
}

/// Read and parse an environment variable, warning when it is malformed.
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}
