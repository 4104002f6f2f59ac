use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chat::{
    parse_seed, ScriptedSource, ViewerZone, DEFAULT_REPEAT_COUNT, DEFAULT_SEED, MAX_REPEAT_COUNT,
};
use crate::ui::bubble::DEFAULT_CORNER_RADIUS;

pub const DEFAULT_MAX_BUBBLE_WIDTH_PERCENT: u16 = 75;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub seed: String,
    pub repeat_count: usize,
    pub corner_radius: f64,
    pub max_bubble_width_percent: u16,
    pub time_zone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_string(),
            repeat_count: DEFAULT_REPEAT_COUNT,
            corner_radius: DEFAULT_CORNER_RADIUS,
            max_bubble_width_percent: DEFAULT_MAX_BUBBLE_WIDTH_PERCENT,
            time_zone: "local".to_string(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatlayout").join("config.toml"))
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`.
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => {
                    tracing::debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_seed(&self.seed).map_err(|e| ConfigError::Invalid {
            field: "seed",
            reason: e.to_string(),
        })?;
        if !(1..=MAX_REPEAT_COUNT).contains(&self.repeat_count) {
            return Err(ConfigError::Invalid {
                field: "repeat_count",
                reason: format!("{} is outside 1..={}", self.repeat_count, MAX_REPEAT_COUNT),
            });
        }
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            return Err(ConfigError::Invalid {
                field: "corner_radius",
                reason: format!("{} is not a non-negative number", self.corner_radius),
            });
        }
        if !(1..=100).contains(&self.max_bubble_width_percent) {
            return Err(ConfigError::Invalid {
                field: "max_bubble_width_percent",
                reason: format!("{} is outside 1..=100", self.max_bubble_width_percent),
            });
        }
        self.zone()?;
        Ok(())
    }

    pub fn zone(&self) -> Result<ViewerZone, ConfigError> {
        self.time_zone
            .parse::<ViewerZone>()
            .map_err(|e| ConfigError::Invalid {
                field: "time_zone",
                reason: e.to_string(),
            })
    }

    pub fn source(&self) -> Result<ScriptedSource, ConfigError> {
        ScriptedSource::from_seed_str(&self.seed, self.repeat_count).map_err(|e| ConfigError::Invalid {
            field: "seed",
            reason: e.to_string(),
        })
    }
}
