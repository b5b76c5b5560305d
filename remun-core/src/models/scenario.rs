use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// One fully resolved salary/dividend split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub gross_salary: Decimal,
    pub gross_dividends: Decimal,
    pub social_contributions: Decimal,
    pub corporate_tax_due: Decimal,
    pub income_tax_on_salary: Decimal,
    pub income_tax_on_dividends: Decimal,
    pub net_disposable_income: Decimal,
    pub effective_overall_tax_rate: Decimal,
}

impl Scenario {
    /// Verifies that no value was created or destroyed while splitting
    /// `taxable_base`.
    ///
    /// Social contributions are carved out of gross salary, so the pool is
    /// exactly `gross_salary + gross_dividends + corporate_tax_due`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NumericalInstability`] when the identity
    /// fails, when any tax or contribution is negative, when contributions
    /// exceed the salary they are levied on, or when net income is negative.
    pub fn reconcile(
        &self,
        taxable_base: Decimal,
    ) -> Result<(), SimulationError> {
        let non_negative = [
            ("gross_salary", self.gross_salary),
            ("gross_dividends", self.gross_dividends),
            ("social_contributions", self.social_contributions),
            ("corporate_tax_due", self.corporate_tax_due),
            ("income_tax_on_salary", self.income_tax_on_salary),
            ("income_tax_on_dividends", self.income_tax_on_dividends),
            ("net_disposable_income", self.net_disposable_income),
        ];
        for (name, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(SimulationError::NumericalInstability(format!(
                    "{name} is negative ({value}) at gross salary {}",
                    self.gross_salary
                )));
            }
        }

        if self.social_contributions > self.gross_salary {
            return Err(SimulationError::NumericalInstability(format!(
                "social contributions {} exceed gross salary {}",
                self.social_contributions, self.gross_salary
            )));
        }

        let reconstructed = self.gross_salary + self.gross_dividends + self.corporate_tax_due;
        if reconstructed != taxable_base {
            return Err(SimulationError::NumericalInstability(format!(
                "scenario reconstructs {reconstructed}, expected taxable base {taxable_base}"
            )));
        }

        Ok(())
    }

    /// Total taxes and contributions paid on the salary and dividend legs.
    pub fn total_levies(&self) -> Decimal {
        self.social_contributions
            + self.corporate_tax_due
            + self.income_tax_on_salary
            + self.income_tax_on_dividends
    }
}

/// Everything returned by one `simulate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub fiscal_year: i32,
    pub taxable_base: Decimal,
    pub optimal: Scenario,
    pub max_salary: Scenario,
    pub max_dividends: Scenario,
    pub recommendations: Vec<String>,
}

impl SimulationResult {
    pub fn gain_over_max_salary(&self) -> Decimal {
        self.optimal.net_disposable_income - self.max_salary.net_disposable_income
    }

    pub fn gain_over_max_dividends(&self) -> Decimal {
        self.optimal.net_disposable_income - self.max_dividends.net_disposable_income
    }
}
