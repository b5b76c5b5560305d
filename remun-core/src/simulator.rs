//! The simulation boundary: one input and a fiscal year in, three scenarios
//! and advisory notes out.

use std::sync::Arc;

use tracing::debug;

use crate::calculations::{
    Optimizer, OptimizerConfig, RecommendationConfig, RecommendationGenerator, ScenarioEvaluator,
};
use crate::error::SimulationError;
use crate::models::{BracketTable, SimulationInput, SimulationResult};
use crate::registry::BracketTableRegistry;

/// Runs simulations against the rule sets held by a shared registry.
///
/// Stateless between calls: the same input and fiscal year always yield the
/// same result for a given registered table.
#[derive(Debug, Clone)]
pub struct Simulator {
    registry: Arc<BracketTableRegistry>,
    optimizer: Optimizer,
    recommendations: RecommendationGenerator,
}

impl Simulator {
    /// A simulator using the exact breakpoint search and default
    /// recommendation thresholds.
    pub fn new(registry: Arc<BracketTableRegistry>) -> Self {
        Self {
            registry,
            optimizer: Optimizer::default(),
            recommendations: RecommendationGenerator::default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`SimulationError::Validation`] if either configuration is
    /// invalid.
    pub fn with_config(
        registry: Arc<BracketTableRegistry>,
        optimizer: OptimizerConfig,
        recommendations: RecommendationConfig,
    ) -> Result<Self, SimulationError> {
        optimizer.validate()?;
        recommendations.validate()?;

        Ok(Self {
            registry,
            optimizer: Optimizer::new(optimizer),
            recommendations: RecommendationGenerator::new(recommendations),
        })
    }

    pub fn registry(&self) -> &Arc<BracketTableRegistry> {
        &self.registry
    }

    /// # Errors
    ///
    /// * [`SimulationError::Validation`] for negative amounts or
    ///   non-positive fiscal parts.
    /// * [`SimulationError::UnknownFiscalYear`] if no table is registered.
    /// * [`SimulationError::NumericalInstability`] if a scenario fails its
    ///   reconciliation check.
    pub fn simulate(
        &self,
        input: &SimulationInput,
        fiscal_year: i32,
    ) -> Result<SimulationResult, SimulationError> {
        let table = self.registry.get(fiscal_year)?;
        let evaluator = ScenarioEvaluator::new(&table, input)?;
        let taxable_base = evaluator.taxable_base();

        debug!(
            fiscal_year,
            taxable_base = %taxable_base,
            fiscal_parts = %input.fiscal_parts,
            "simulating remuneration split"
        );

        let outcome = self.optimizer.optimize(&evaluator)?;
        let recommendations = self
            .recommendations
            .generate(
                taxable_base,
                &outcome.optimal,
                &outcome.max_salary,
                &outcome.max_dividends,
            )
            .iter()
            .map(ToString::to_string)
            .collect();

        Ok(SimulationResult {
            fiscal_year,
            taxable_base,
            optimal: outcome.optimal,
            max_salary: outcome.max_salary,
            max_dividends: outcome.max_dividends,
            recommendations,
        })
    }

    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownFiscalYear`] if the year is absent.
    pub fn get_bracket_table(
        &self,
        fiscal_year: i32,
    ) -> Result<Arc<BracketTable>, SimulationError> {
        self.registry.get(fiscal_year)
    }
}
