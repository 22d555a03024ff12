use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::aggregate::Weights;
use crate::matching::MatchingParams;
use crate::model::condition::ReferenceSet;
use crate::optimizer::OptimizerParams;

pub const CONFIG_ENV: &str = "POOL_SCORE_CONFIG";

/// Engine tuning loaded from YAML. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    pub weights: Weights,
    pub optimizer: OptimizerParams,
    pub matching: MatchingParams,
}

impl EngineConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = match env::var(CONFIG_ENV) {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw),
            _ => return Ok(Self::default()),
        };
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: EngineConfig = read_yaml(path)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }
}

impl ReferenceSet {
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        read_yaml(path)
    }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Deserialize {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
