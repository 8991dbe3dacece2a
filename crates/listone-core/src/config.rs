// Configuration loading and parsing (config/listone.toml).

use crate::aggregate::DEFAULT_PREFERRED_COMMENT_SOURCE;
use crate::registry::{SeasonSources, SourceRegistry};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Name of the configuration file inside `config/` and `defaults/`.
pub const CONFIG_FILE_NAME: &str = "listone.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the registry's source files are resolved against.
    pub data_dir: PathBuf,
    /// Where the consolidated database is written.
    pub output_path: PathBuf,
    /// CSV field separator.
    pub delimiter: u8,
    pub preferred_comment_source: String,
    pub registry: SourceRegistry,
}

// ---------------------------------------------------------------------------
// listone.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    paths: PathsSection,
    #[serde(default)]
    reader: ReaderSection,
    #[serde(default)]
    aggregation: AggregationSection,
    /// When omitted, the built-in registry is used.
    #[serde(default)]
    seasons: Option<Vec<SeasonSources>>,
}

#[derive(Debug, Clone, Deserialize)]
struct PathsSection {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default = "default_output")]
    output: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ReaderSection {
    #[serde(default = "default_delimiter")]
    delimiter: String,
}

impl Default for ReaderSection {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AggregationSection {
    #[serde(default = "default_preferred_comment_source")]
    preferred_comment_source: String,
}

impl Default for AggregationSection {
    fn default() -> Self {
        Self {
            preferred_comment_source: default_preferred_comment_source(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output() -> PathBuf {
    PathBuf::from("players_database.json")
}

fn default_delimiter() -> String {
    ",".into()
}

fn default_preferred_comment_source() -> String {
    DEFAULT_PREFERRED_COMMENT_SOURCE.into()
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/listone.toml` relative to `base_dir`. Relative
/// paths inside the file are resolved against `base_dir`.
///
/// This does not copy defaults; prefer `load_config_in()` which does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    let text = read_file(&path)?;
    parse_config(&text, base_dir).map_err(|e| match e {
        ConfigError::ParseError { source, .. } => ConfigError::ParseError { path, source },
        other => other,
    })
}

/// Parse configuration text, resolving relative paths against `base_dir`.
pub fn parse_config(text: &str, base_dir: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: PathBuf::from(CONFIG_FILE_NAME),
        source: e,
    })?;

    let delimiter = parse_delimiter(&file.reader.delimiter)?;
    let registry = match file.seasons {
        Some(seasons) => SourceRegistry::new(seasons),
        None => SourceRegistry::builtin(),
    };

    let config = Config {
        data_dir: base_dir.join(&file.paths.data_dir),
        output_path: base_dir.join(&file.paths.output),
        delimiter,
        preferred_comment_source: file.aggregation.preferred_comment_source,
        registry,
    };

    validate(&config)?;

    Ok(config)
}

/// Make sure `config/listone.toml` exists, seeding it from
/// `defaults/listone.toml` when it does not. An existing config file is never
/// touched. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE_NAME);
    if target.is_file() {
        return Ok(None);
    }

    let default = base_dir.join("defaults").join(CONFIG_FILE_NAME);
    if !default.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither config/{CONFIG_FILE_NAME} nor defaults/{CONFIG_FILE_NAME} found in {}; \
                 run from the project root or pass --base-dir",
                base_dir.display()
            ),
        });
    }

    if let Some(config_dir) = target.parent() {
        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
    }
    std::fs::copy(&default, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "failed to copy {} to {}: {e}",
            default.display(),
            target.display()
        ),
    })?;

    info!("seeded {} from {}", target.display(), default.display());
    Ok(Some(target))
}

/// Copy missing defaults into `base_dir/config/`, then load from there.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_in(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(ConfigError::ValidationError {
            field: "reader.delimiter".into(),
            message: format!("must be a single ASCII character, got {raw:?}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.preferred_comment_source.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "aggregation.preferred_comment_source".into(),
            message: "must not be empty".into(),
        });
    }

    config
        .registry
        .validate()
        .map_err(|e| ConfigError::ValidationError {
            field: "seasons".into(),
            message: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
