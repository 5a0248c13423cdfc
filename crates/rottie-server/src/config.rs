//! Coordinator configuration.
//!
//! Loaded from TOML; every field is optional and falls back to
//! [`CoordinatorConfig::default`].
//!
//! ```toml
//! max_pack_changes = 1000
//! max_pull_changes = 1000
//! exclude_own_changes = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Largest number of changes accepted in one pushed pack.
    pub max_pack_changes: usize,
    /// Largest number of changes returned by one pull.
    pub max_pull_changes: usize,
    /// Leave an actor's own changes out of its pull responses.
    pub exclude_own_changes: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_pack_changes: 1000,
            max_pull_changes: 1000,
            exclude_own_changes: true,
        }
    }
}

impl CoordinatorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CoordinatorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pack_changes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_pack_changes",
                reason: "must be at least 1",
            });
        }
        if self.max_pull_changes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_pull_changes",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
