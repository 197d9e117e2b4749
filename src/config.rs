//! User configuration.
//!
//! Settings come from a TOML file, `.histedit.toml` at the repository root
//! unless another path is given. Every key is optional; command-line flags
//! take precedence over the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::style::ColorMode;

/// Name of the per-repository configuration file.
pub const FILE_NAME: &str = ".histedit.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Baseline the branch overview lists commits against (e.g., `origin/main`).
    pub upstream: String,

    pub color: ColorMode,

    /// Check the replayed tree against the expected result after every edit.
    pub verify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: "origin/master".to_string(),
            color: ColorMode::Auto,
            verify: true,
        }
    }
}

impl Config {
    /// Parse a config from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the config at `path`, which must exist.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| Error::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Load `.histedit.toml` from the repository root, or fall back to defaults.
    pub fn discover(root: &Path) -> Result<Self, Error> {
        let path = root.join(FILE_NAME);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
