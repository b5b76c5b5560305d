//! Tax computations and the salary/dividend search.
//!
//! [`tax_calculator`] holds the per-levy formulas, [`ScenarioEvaluator`]
//! composes them into one split of the taxable base, [`Optimizer`] searches
//! the splits and [`RecommendationGenerator`] turns the outcome into notes.

pub mod common;
mod optimizer;
mod recommendations;
mod scenario_evaluator;
pub mod tax_calculator;

pub use optimizer::{
    MAX_GRID_POINTS, OPTIMUM_TOLERANCE, OptimizationOutcome, Optimizer, OptimizerConfig,
    SearchStrategy,
};
pub use recommendations::{Recommendation, RecommendationConfig, RecommendationGenerator};
pub use scenario_evaluator::ScenarioEvaluator;
