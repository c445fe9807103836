use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;
use thiserror::Error;

/// Log everything from our crates, only warnings from the rest.
const DEFAULT_LOG_FILTER: &str = "\
    warn,\
    common_store=debug,\
    common_story=debug,\
    story_player=debug,\
    ";

/// Optional settings of the player, read from a .toml file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Same syntax as tracing's env filter directives.
    pub(crate) log_filter: String,
    /// Shown when waiting for the player to pick a choice.
    pub(crate) prompt: String,
    /// Overrides values of the dialogue's exposed properties.
    /// Every name must exist in the dialogue.
    pub(crate) properties: BTreeMap<String, String>,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error parsing config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            prompt: "> ".to_owned(),
            properties: BTreeMap::new(),
        }
    }
}

impl Config {
    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&s)?)
    }
}
