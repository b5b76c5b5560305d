//! Wiring shared by every subcommand: rule sets, simulator, fiscal year.

use std::sync::Arc;

use anyhow::{Context, Result};
use remun_core::{BracketTableRegistry, Simulator};
use remun_data::RuleSetLoader;
use tracing::info;

use crate::config::CliConfig;

/// Registry holding the configured rule sets, or the built-in ones.
pub fn build_registry(config: &CliConfig) -> Result<BracketTableRegistry> {
    let tables = match config.rules.paths() {
        Some((parameters, brackets)) => {
            info!(
                parameters = %parameters.display(),
                brackets = %brackets.display(),
                "loading rule sets"
            );
            RuleSetLoader::read_files(parameters, brackets).with_context(|| {
                format!(
                    "Failed to load rule sets from: {} and {}",
                    parameters.display(),
                    brackets.display()
                )
            })?
        }
        None => RuleSetLoader::builtin().context("Failed to load built-in rule sets")?,
    };

    let registry = BracketTableRegistry::new();
    RuleSetLoader::load(&registry, tables).context("Failed to register rule sets")?;
    Ok(registry)
}

pub fn build_simulator(config: &CliConfig) -> Result<Simulator> {
    let registry = Arc::new(build_registry(config)?);
    Simulator::with_config(
        registry,
        config.optimizer,
        config.recommendations.clone(),
    )
    .context("Invalid simulator configuration")
}

/// `requested`, or the most recent registered fiscal year.
pub fn resolve_fiscal_year(
    registry: &BracketTableRegistry,
    requested: Option<i32>,
) -> Result<i32> {
    match requested {
        Some(year) => Ok(year),
        None => registry
            .latest_fiscal_year()
            .context("No rule sets are registered"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use remun_core::calculations::{OptimizerConfig, SearchStrategy};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_config_uses_builtin_rules() {
        let registry = build_registry(&CliConfig::default()).unwrap();

        assert_eq!(registry.fiscal_years(), vec![2024, 2025]);
    }

    #[test]
    fn missing_rule_files_fail_with_context() {
        let mut config = CliConfig::default();
        config.rules.parameters = Some("no/such/parameters.csv".into());
        config.rules.brackets = Some("no/such/brackets.csv".into());

        let err = build_registry(&config).unwrap_err();

        assert!(err.to_string().starts_with("Failed to load rule sets from"));
    }

    #[test]
    fn fiscal_year_defaults_to_latest() {
        let registry = build_registry(&CliConfig::default()).unwrap();

        assert_eq!(resolve_fiscal_year(&registry, None).unwrap(), 2025);
        assert_eq!(resolve_fiscal_year(&registry, Some(2024)).unwrap(), 2024);
    }

    #[test]
    fn fiscal_year_requires_a_registered_table() {
        let registry = BracketTableRegistry::new();

        assert!(resolve_fiscal_year(&registry, None).is_err());
    }

    #[test]
    fn simulator_rejects_invalid_optimizer() {
        let config = CliConfig {
            optimizer: OptimizerConfig {
                strategy: SearchStrategy::Grid { step: dec!(-1) },
            },
            ..Default::default()
        };

        assert!(build_simulator(&config).is_err());
    }
}
