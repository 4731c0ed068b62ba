//! Configuration loading from typednil.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use typednil_diagnostics::Severity;

pub const CONFIG_FILE_NAME: &str = "typednil.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid severity threshold: {0}")]
    Severity(String),
    #[error("invalid analyzer flags: {0}")]
    Flags(#[from] clap::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub typednil: TypednilConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypednilConfig {
    pub severity_threshold: String,
    /// 0 = unlimited.
    pub max_diagnostics: usize,
    /// Explicit facts directory. `None` = use platform default.
    pub facts_dir: Option<String>,
    /// Disable fact persistence entirely.
    pub no_persist: bool,
    /// Raw flag string forwarded to the analyzer.
    pub flags: String,
}

impl Default for TypednilConfig {
    fn default() -> Self {
        Self {
            severity_threshold: "warning".to_string(),
            max_diagnostics: 0,
            facts_dir: None,
            no_persist: false,
            flags: String::new(),
        }
    }
}

impl TypednilConfig {
    pub fn severity(&self) -> Result<Severity, ConfigError> {
        self.severity_threshold.parse().map_err(ConfigError::Severity)
    }
}

/// Resolve the facts directory.
/// Priority: explicit config > platform default > None (disabled).
pub fn resolve_facts_dir(config: &TypednilConfig) -> Option<PathBuf> {
    if config.no_persist {
        return None;
    }
    if let Some(ref dir) = config.facts_dir {
        return Some(PathBuf::from(dir));
    }
    dirs::cache_dir().map(|d| d.join("typednil").join("facts"))
}

/// Find and load typednil.toml, walking up from `start_dir`.
/// Returns default config if no file found.
pub fn load_config(start_dir: &Path) -> Result<Config, ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config_file(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Walk up directories looking for typednil.toml.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Default TOML content for `typednil init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"[typednil]
severity_threshold = "warning"
# 0 = unlimited
max_diagnostics = 0
# facts_dir = "~/.cache/typednil/facts"  # auto-detected if omitted
no_persist = false
# Raw flag string forwarded to the analyzer (it currently defines none).
flags = ""
"#;
