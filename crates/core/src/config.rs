//! Generation and watcher configuration
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. `~/.ai_helper/config.json` (optional, only the keys present override defaults)
//!
//! A missing file is not an error. A file that exists but cannot be parsed is fatal.

use crate::error::ConfigError;
use crate::fsutil::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the user's home holding config and logs
pub const CONFIG_DIR_NAME: &str = ".ai_helper";

/// Config file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_MODEL: &str = "deepseek-r1:1.5b";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MARKER: &str = "//ai";
pub const DEFAULT_EXTENSIONS: &[&str] = &["py", "js", "ts", "jsx", "tsx", "java", "cpp", "c"];

/// Resolved configuration. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Model identifier sent with every request
    pub model: String,

    /// Generation endpoint URL
    #[serde(rename = "api_endpoint")]
    pub endpoint: String,

    /// Sampling temperature, in [0, 2]
    pub temperature: f64,

    /// Token budget per generation
    pub max_tokens: u32,

    /// Trigger marker (comment prefix + keyword)
    pub marker: String,

    /// Watched file extensions, without the leading dot
    pub extensions: Vec<String>,

    /// Minimum time between accepted events for one path
    pub debounce_ms: u64,

    /// Timeout for a single generation request
    pub timeout_secs: u64,

    /// Maximum number of files processed concurrently
    pub max_concurrency: usize,

    /// Skip markers that are already followed by an annotation block
    pub skip_annotated: bool,

    /// Ignore files matched by the watched root's `.gitignore`
    pub respect_gitignore: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.7,
            max_tokens: 500,
            marker: DEFAULT_MARKER.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            debounce_ms: 1000,
            timeout_secs: 30,
            max_concurrency: 2,
            skip_annotated: true,
            respect_gitignore: true,
        }
    }
}

/// On-disk shape: every key optional, unknown keys ignored
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    model: Option<String>,
    api_endpoint: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    marker: Option<String>,
    extensions: Option<Vec<String>>,
    debounce_ms: Option<u64>,
    timeout_secs: Option<u64>,
    max_concurrency: Option<usize>,
    skip_annotated: Option<bool>,
    respect_gitignore: Option<bool>,
}

impl Config {
    /// Overlay the keys present in `file` onto `self`
    fn overlay(mut self, file: FileConfig) -> Self {
        if let Some(v) = file.model {
            self.model = v;
        }
        if let Some(v) = file.api_endpoint {
            self.endpoint = v;
        }
        if let Some(v) = file.temperature {
            self.temperature = v;
        }
        if let Some(v) = file.max_tokens {
            self.max_tokens = v;
        }
        if let Some(v) = file.marker {
            self.marker = v;
        }
        if let Some(v) = file.extensions {
            self.extensions = v
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
        }
        if let Some(v) = file.debounce_ms {
            self.debounce_ms = v;
        }
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = file.max_concurrency {
            self.max_concurrency = v;
        }
        if let Some(v) = file.skip_annotated {
            self.skip_annotated = v;
        }
        if let Some(v) = file.respect_gitignore {
            self.respect_gitignore = v;
        }
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".into()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if self.marker.trim().is_empty() {
            return Err(ConfigError::Invalid("marker must not be empty".into()));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("extensions must not be empty".into()));
        }
        if self.debounce_ms == 0 || self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "debounce_ms and timeout_secs must be positive".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `~/.ai_helper`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoHome)
}

/// `~/.ai_helper/config.json`
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// `~/.ai_helper/logs`
pub fn log_dir() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("logs"))
}

/// Load from the per-user config path
pub fn load() -> Result<Config, ConfigError> {
    load_from(&config_file_path()?)
}

/// Load from an explicit path, falling back to defaults when it does not exist
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: FileConfig = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let config = Config::default().overlay(file);
    config.validate()?;
    Ok(config)
}

/// Write `config` to `path` as pretty JSON, replacing any existing file atomically
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, (json + "\n").as_bytes()).map_err(io_err)
}

/// Create `path` with defaults if it does not exist yet. Returns whether it was created.
pub fn init_if_missing(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    save_to(&Config::default(), path)?;
    Ok(true)
}

/// Example config file contents
pub fn example_config() -> String {
    // Serializing a plain struct of strings and numbers cannot fail
    serde_json::to_string_pretty(&Config::default()).unwrap_or_default()
}
