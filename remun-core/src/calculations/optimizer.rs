//! Salary/dividend split search.
//!
//! Net disposable income is piecewise linear in gross salary: contributions
//! are proportional, and corporate and personal tax each change slope only
//! where their base crosses a threshold. The maximum therefore sits on an
//! endpoint or a breakpoint, and [`SearchStrategy::Breakpoints`] evaluates
//! exactly those salaries:
//!
//! - `0` and `taxable_base`
//! - `taxable_base − corporate_tax_threshold`, where remaining profit crosses
//!   the corporate threshold
//! - `(threshold × fiscal_parts − other_household_income) / (1 − social_rate)`
//!   for every personal threshold, where the household quotient crosses it
//!
//! Breakpoints are evaluated at the whole cents on either side, since amounts
//! are carried to the cent.
//!
//! [`SearchStrategy::Grid`] is a uniform fallback. The objective's slope never
//! exceeds 1 in magnitude (a unit of salary moves at most a unit of net
//! income), so a grid of step `s` lands within `s` of the true maximum.
//!
//! Either way the reported optimum is within [`OPTIMUM_TOLERANCE`] of the true
//! maximum (the grid requires `step <= 1`). On exactly equal net income the
//! smallest salary wins.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::ScenarioEvaluator;
use crate::calculations::common::cent_bounds;
use crate::error::SimulationError;
use crate::models::Scenario;

/// Guaranteed distance, in currency units, between the reported optimum and
/// the true maximum of net disposable income.
pub const OPTIMUM_TOLERANCE: Decimal = Decimal::ONE;

/// Upper bound on evaluations a grid search may request.
pub const MAX_GRID_POINTS: usize = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Exact enumeration of the objective's breakpoints.
    #[default]
    Breakpoints,
    /// Every multiple of `step` in `[0, taxable_base]`, plus the base itself.
    Grid { step: Decimal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub strategy: SearchStrategy,
}

impl OptimizerConfig {
    /// # Errors
    ///
    /// Returns [`SimulationError::Validation`] if a grid step is not positive.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if let SearchStrategy::Grid { step } = self.strategy {
            if step <= Decimal::ZERO {
                return Err(SimulationError::validation(
                    "grid_step",
                    format!("must be positive, got {step}"),
                ));
            }
        }
        Ok(())
    }
}

/// The optimum plus both boundary splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationOutcome {
    pub optimal: Scenario,
    pub max_salary: Scenario,
    pub max_dividends: Scenario,
    pub candidates_evaluated: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Finds the salary maximizing net disposable income and evaluates the
    /// all-salary and all-dividend boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if the configuration is invalid, a grid
    /// would exceed [`MAX_GRID_POINTS`], or any evaluation fails.
    pub fn optimize(
        &self,
        evaluator: &ScenarioEvaluator<'_>,
    ) -> Result<OptimizationOutcome, SimulationError> {
        self.config.validate()?;

        let taxable_base = evaluator.taxable_base();
        let candidates = match self.config.strategy {
            SearchStrategy::Breakpoints => breakpoint_candidates(evaluator),
            SearchStrategy::Grid { step } => grid_candidates(taxable_base, step)?,
        };

        let mut optimal: Option<Scenario> = None;
        for salary in &candidates {
            let scenario = evaluator.evaluate(*salary)?;
            // Candidates ascend, so a strict comparison keeps the smallest
            // salary among exact ties.
            let improves = optimal
                .as_ref()
                .is_none_or(|best| scenario.net_disposable_income > best.net_disposable_income);
            if improves {
                optimal = Some(scenario);
            }
        }

        let max_dividends = evaluator.evaluate(Decimal::ZERO)?;
        let max_salary = evaluator.evaluate(taxable_base)?;
        let optimal = optimal.unwrap_or_else(|| max_dividends.clone());

        debug!(
            strategy = ?self.config.strategy,
            candidates = candidates.len(),
            optimal_salary = %optimal.gross_salary,
            net_disposable_income = %optimal.net_disposable_income,
            "selected salary/dividend split"
        );

        Ok(OptimizationOutcome {
            optimal,
            max_salary,
            max_dividends,
            candidates_evaluated: candidates.len(),
        })
    }
}

/// Endpoints plus the cent-rounded salaries at every threshold crossing,
/// sorted ascending without duplicates.
fn breakpoint_candidates(evaluator: &ScenarioEvaluator<'_>) -> Vec<Decimal> {
    let table = evaluator.table();
    let input = evaluator.input();
    let taxable_base = evaluator.taxable_base();

    let mut crossings = vec![taxable_base - table.corporate_tax_threshold];

    // A crossing that overflows lies far beyond any representable base.
    let net_salary_ratio = Decimal::ONE - table.social_contribution_rate;
    if net_salary_ratio > Decimal::ZERO {
        crossings.extend(table.thresholds().filter_map(|threshold| {
            threshold
                .checked_mul(input.fiscal_parts)?
                .checked_sub(input.other_household_income)?
                .checked_div(net_salary_ratio)
        }));
    }

    let mut candidates = vec![Decimal::ZERO, taxable_base];
    for crossing in crossings {
        if crossing <= Decimal::ZERO || crossing >= taxable_base {
            continue;
        }
        let (below, above) = cent_bounds(crossing);
        candidates.push(below);
        candidates.push(above.min(taxable_base));
    }

    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

fn grid_candidates(
    taxable_base: Decimal,
    step: Decimal,
) -> Result<Vec<Decimal>, SimulationError> {
    let points = taxable_base.checked_div(step).map(|points| points.floor());
    if points.is_none_or(|points| points > Decimal::from(MAX_GRID_POINTS)) {
        return Err(SimulationError::validation(
            "grid_step",
            format!("step {step} needs more than {MAX_GRID_POINTS} evaluations"),
        ));
    }

    let mut candidates = Vec::new();
    let mut salary = Decimal::ZERO;
    while salary < taxable_base {
        candidates.push(salary);
        salary += step;
    }
    candidates.push(taxable_base);
    Ok(candidates)
}
