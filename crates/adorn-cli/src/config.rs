//! CLI configuration (adorn.toml)

use std::path::Path;

use adorn_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "adorn.toml";

/// Upper bound for `showcase.minimum-length`
pub const MAX_MINIMUM_LENGTH: usize = 1024;

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Contents of adorn.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdornConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Showcase settings
    pub showcase: ShowcaseConfig,
}

/// Parameters fed to the showcase's factory annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShowcaseConfig {
    /// Selector passed to `@Component({selector})`
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Length passed to `@SmallestLength`
    #[serde(default = "default_minimum_length")]
    pub minimum_length: usize,
    /// Sauce passed to `@Sauce`
    #[serde(default = "default_sauce")]
    pub sauce: String,
}

fn default_selector() -> String {
    "#my_profile".to_string()
}

fn default_minimum_length() -> usize {
    4
}

fn default_sauce() -> String {
    "pesto".to_string()
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            minimum_length: default_minimum_length(),
            sauce: default_sauce(),
        }
    }
}

impl AdornConfig {
    /// Parse a config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a config from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: AdornConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config for a CLI invocation
    ///
    /// An explicit path must exist. Without one, `adorn.toml` in the working
    /// directory is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.showcase.selector.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "showcase.selector cannot be empty".to_string(),
            ));
        }

        if self.showcase.minimum_length == 0 {
            return Err(ConfigError::ValidationError(
                "showcase.minimum-length must be at least 1".to_string(),
            ));
        }

        if self.showcase.minimum_length > MAX_MINIMUM_LENGTH {
            return Err(ConfigError::ValidationError(format!(
                "showcase.minimum-length must be at most {}",
                MAX_MINIMUM_LENGTH
            )));
        }

        if self.showcase.sauce.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "showcase.sauce cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
