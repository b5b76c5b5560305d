//! CLI configuration file.
//!
//! Every key is optional:
//!
//! ```toml
//! log_level = "debug"
//!
//! [rules]
//! parameters = "rules/fiscal_parameters.csv"
//! brackets = "rules/income_tax_brackets.csv"
//!
//! [recommendations]
//! significant_gain_ratio = "0.02"
//! minimum_salary_floor = "12000"
//!
//! [optimizer.strategy]
//! kind = "grid"
//! step = "0.5"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use remun_core::SimulationError;
use remun_core::calculations::{OptimizerConfig, RecommendationConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "remun.toml";

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(String),

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("[rules] needs both `parameters` and `brackets`, or neither")]
    IncompleteRules,

    #[error(transparent)]
    Invalid(#[from] SimulationError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub log_level: Option<String>,
    pub rules: RulesConfig,
    pub recommendations: RecommendationConfig,
    pub optimizer: OptimizerConfig,
}

/// CSV files replacing the built-in rule sets.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    pub parameters: Option<PathBuf>,
    pub brackets: Option<PathBuf>,
}

impl RulesConfig {
    /// Both paths, when configured.
    pub fn paths(&self) -> Option<(&Path, &Path)> {
        match (&self.parameters, &self.brackets) {
            (Some(parameters), Some(brackets)) => Some((parameters, brackets)),
            _ => None,
        }
    }
}

impl CliConfig {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.parameters.is_some() != self.rules.brackets.is_some() {
            return Err(ConfigError::IncompleteRules);
        }
        self.recommendations.validate()?;
        self.optimizer.validate()?;
        Ok(())
    }
}

/// Parses and validates config text.
pub fn parse_config(raw: &str) -> Result<CliConfig, ConfigError> {
    let config: CliConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Loads `path`, or [`DEFAULT_CONFIG_FILENAME`] from the working directory
/// when `path` is `None`.
///
/// An explicit path must exist. A missing default file yields the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));

    if !config_path.exists() {
        if path.is_some() {
            return Err(ConfigError::NotFound(config_path.display().to_string()));
        }
        return Ok(CliConfig::default());
    }

    let raw = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.display().to_string(),
        source,
    })?;

    parse_config(&raw)
}
