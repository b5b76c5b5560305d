//! Advisory notes derived by comparing the optimum with the boundary splits.
//!
//! Rules run in a fixed order and each one either emits a single
//! [`Recommendation`] or nothing:
//!
//! 1. gain over paying everything as salary, when significant
//! 2. gain over distributing everything as dividends, when significant
//! 3. low optimal salary (near zero, or under a caller-supplied floor)
//! 4. effective overall rate above the high-rate threshold
//!
//! A gain is significant when it exceeds
//! [`RecommendationConfig::significant_gain_ratio`] of the taxable base.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{format_amount, round_half_up};
use crate::error::SimulationError;
use crate::models::Scenario;

/// Thresholds driving the recommendation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Fraction of the taxable base a gain must exceed to be reported.
    pub significant_gain_ratio: Decimal,

    /// Optimal salaries at or below this amount count as near zero.
    pub low_salary_threshold: Decimal,

    /// Caller-supplied minimum salary. Only reported against, never enforced.
    pub minimum_salary_floor: Option<Decimal>,

    /// Effective overall rates strictly above this trigger a warning.
    pub high_rate_threshold: Decimal,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            significant_gain_ratio: Decimal::new(1, 2),
            low_salary_threshold: Decimal::ONE,
            minimum_salary_floor: None,
            high_rate_threshold: Decimal::new(45, 2),
        }
    }
}

impl RecommendationConfig {
    /// # Errors
    ///
    /// Returns [`SimulationError::Validation`] if a ratio is outside [0, 1] or
    /// an amount is negative.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let ratios = [
            ("significant_gain_ratio", self.significant_gain_ratio),
            ("high_rate_threshold", self.high_rate_threshold),
        ];
        for (field, ratio) in ratios {
            if ratio < Decimal::ZERO || ratio > Decimal::ONE {
                return Err(SimulationError::validation(
                    field,
                    format!("must be between 0 and 1, got {ratio}"),
                ));
            }
        }

        if self.low_salary_threshold < Decimal::ZERO {
            return Err(SimulationError::validation(
                "low_salary_threshold",
                format!("must be non-negative, got {}", self.low_salary_threshold),
            ));
        }
        if let Some(floor) = self.minimum_salary_floor {
            if floor < Decimal::ZERO {
                return Err(SimulationError::validation(
                    "minimum_salary_floor",
                    format!("must be non-negative, got {floor}"),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    GainOverMaxSalary {
        optimal_salary: Decimal,
        gain: Decimal,
    },
    GainOverMaxDividends {
        optimal_salary: Decimal,
        gain: Decimal,
    },
    LowSalary {
        optimal_salary: Decimal,
        minimum_salary_floor: Option<Decimal>,
    },
    HighEffectiveRate {
        rate: Decimal,
        threshold: Decimal,
    },
}

impl fmt::Display for Recommendation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::GainOverMaxSalary {
                optimal_salary,
                gain,
            } => write!(
                f,
                "Paying {} as salary and distributing the rest as dividends yields {} more \
                 net income than paying the whole profit as salary.",
                format_amount(*optimal_salary),
                format_amount(*gain)
            ),
            Self::GainOverMaxDividends {
                optimal_salary,
                gain,
            } => write!(
                f,
                "Paying {} as salary yields {} more net income than distributing the whole \
                 profit as dividends.",
                format_amount(*optimal_salary),
                format_amount(*gain)
            ),
            Self::LowSalary {
                optimal_salary,
                minimum_salary_floor: Some(floor),
            } => write!(
                f,
                "The optimal salary of {} is below the minimum salary floor of {}. The floor \
                 is not applied to this simulation; check whether it binds before following \
                 this split.",
                format_amount(*optimal_salary),
                format_amount(*floor)
            ),
            Self::LowSalary {
                optimal_salary,
                minimum_salary_floor: None,
            } => write!(
                f,
                "The optimal salary of {} is close to zero. A minimum salary may be needed in \
                 practice, for example to open social protection rights.",
                format_amount(*optimal_salary)
            ),
            Self::HighEffectiveRate { rate, threshold } => write!(
                f,
                "The effective overall tax rate of {} exceeds {}. Consider reviewing \
                 deductible expenses or other structuring options.",
                format_percent(*rate),
                format_percent(*threshold)
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationGenerator {
    config: RecommendationConfig,
}

impl RecommendationGenerator {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Applies every rule in order.
    pub fn generate(
        &self,
        taxable_base: Decimal,
        optimal: &Scenario,
        max_salary: &Scenario,
        max_dividends: &Scenario,
    ) -> Vec<Recommendation> {
        let significant_gain = taxable_base * self.config.significant_gain_ratio;

        [
            self.gain_over_max_salary(optimal, max_salary, significant_gain),
            self.gain_over_max_dividends(optimal, max_dividends, significant_gain),
            self.low_salary(taxable_base, optimal),
            self.high_effective_rate(optimal),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn gain_over_max_salary(
        &self,
        optimal: &Scenario,
        max_salary: &Scenario,
        significant_gain: Decimal,
    ) -> Option<Recommendation> {
        let gain = optimal.net_disposable_income - max_salary.net_disposable_income;
        (gain > significant_gain).then_some(Recommendation::GainOverMaxSalary {
            optimal_salary: optimal.gross_salary,
            gain,
        })
    }

    fn gain_over_max_dividends(
        &self,
        optimal: &Scenario,
        max_dividends: &Scenario,
        significant_gain: Decimal,
    ) -> Option<Recommendation> {
        let gain = optimal.net_disposable_income - max_dividends.net_disposable_income;
        (gain > significant_gain).then_some(Recommendation::GainOverMaxDividends {
            optimal_salary: optimal.gross_salary,
            gain,
        })
    }

    /// Skipped for an empty taxable base: there is nothing to pay out.
    fn low_salary(
        &self,
        taxable_base: Decimal,
        optimal: &Scenario,
    ) -> Option<Recommendation> {
        if taxable_base.is_zero() {
            return None;
        }

        let salary = optimal.gross_salary;
        let below_floor = self
            .config
            .minimum_salary_floor
            .filter(|floor| salary < *floor);
        let near_zero = salary <= self.config.low_salary_threshold;

        (below_floor.is_some() || near_zero).then_some(Recommendation::LowSalary {
            optimal_salary: salary,
            minimum_salary_floor: below_floor,
        })
    }

    fn high_effective_rate(
        &self,
        optimal: &Scenario,
    ) -> Option<Recommendation> {
        let rate = optimal.effective_overall_tax_rate;
        (rate > self.config.high_rate_threshold).then_some(Recommendation::HighEffectiveRate {
            rate,
            threshold: self.config.high_rate_threshold,
        })
    }
}

/// `0.445853` → `44.59%`
fn format_percent(rate: Decimal) -> String {
    format!("{:.2}%", round_half_up(rate * Decimal::ONE_HUNDRED))
}
