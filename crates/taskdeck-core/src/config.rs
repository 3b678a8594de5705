#![forbid(unsafe_code)]

//! Board configuration as data.
//!
//! Captures the tunable parameters of the drag engine and the logging
//! bootstrap as a single [`BoardConfig`] that can be loaded from TOML or JSON
//! at startup.
//!
//! # Loading
//!
//! ```toml
//! # taskdeck.toml
//! [drag]
//! activation_distance = 3.0
//!
//! [log]
//! level = "debug"
//! format = "json"
//! ```
//!
//! ```rust,ignore
//! let config = BoardConfig::from_toml_file("taskdeck.toml")?;
//! let config = BoardConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! Every field has a default, so a partial file only overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default pointer displacement before a press becomes a drag.
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 3.0;

/// Environment variable consulted for a log filter directive.
pub const LOG_ENV_VAR: &str = "TASKDECK_LOG";

// ---------------------------------------------------------------------------
// Top-level BoardConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for a TaskDeck board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Drag gesture parameters.
    pub drag: DragConfig,
    /// Logging bootstrap parameters.
    pub log: LogConfig,
}

impl BoardConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(ConfigError::TomlSerialize)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let distance = self.drag.activation_distance;
        if !distance.is_finite() || distance < 0.0 {
            errors.push(format!(
                "drag.activation_distance must be a finite, non-negative number, got {distance}"
            ));
        }

        if !matches!(
            self.log.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        ) {
            errors.push(format!(
                "log.level must be one of trace, debug, info, warn, error, off; got {:?}",
                self.log.level
            ));
        }

        errors
    }

    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Configuration for drag gesture detection.
///
/// Controls how pointer movement is interpreted as a drag versus a click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Euclidean displacement a press must strictly exceed before a drag
    /// starts. Default: 3.0.
    pub activation_distance: f64,
    /// Whether pressing a column outside any card drags the column itself.
    /// Default: false.
    pub allow_container_drag: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            allow_container_drag: false,
        }
    }
}

impl DragConfig {
    /// Create a config with a custom activation distance.
    #[must_use]
    pub fn with_activation_distance(mut self, distance: f64) -> Self {
        self.activation_distance = distance;
        self
    }

    /// Allow dragging whole columns.
    #[must_use]
    pub fn with_container_drag(mut self) -> Self {
        self.allow_container_drag = true;
        self
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging bootstrap parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when no filter directive is given. Default: "info".
    pub level: String,
    /// Output format. Default: pretty.
    pub format: LogFormat,
    /// Full `EnvFilter` directive; overrides `level` when set. The
    /// `TASKDECK_LOG` environment variable overrides both.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            filter: None,
        }
    }
}

impl LogConfig {
    /// The filter directive to install, in precedence order: environment,
    /// explicit filter, level.
    #[must_use]
    pub fn directive(&self) -> String {
        self.directive_with(std::env::var(LOG_ENV_VAR).ok().as_deref())
    }

    /// [`directive`](Self::directive) with the environment value passed in.
    /// A blank `env` counts as unset.
    #[must_use]
    pub fn directive_with(&self, env: Option<&str>) -> String {
        env.filter(|v| !v.trim().is_empty())
            .map(str::to_owned)
            .or_else(|| self.filter.clone())
            .unwrap_or_else(|| self.level.to_ascii_lowercase())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a board configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// TOML serialization error.
    TomlSerialize(toml::ser::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::TomlSerialize(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
