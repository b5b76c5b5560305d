use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SimulationError;
use crate::models::MaritalStatus;

/// Caller-supplied facts for one simulation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationInput {
    pub projected_revenue: Decimal,
    pub deductible_expenses: Decimal,
    pub marital_status: MaritalStatus,
    pub fiscal_parts: Decimal,
    pub other_household_income: Decimal,
    /// Informational only; no rule consumes it yet.
    pub existing_wealth: Decimal,
}

impl SimulationInput {
    /// Rejects negative amounts and non-positive fiscal parts.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Validation`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let amounts = [
            ("projected_revenue", self.projected_revenue),
            ("deductible_expenses", self.deductible_expenses),
            ("other_household_income", self.other_household_income),
            ("existing_wealth", self.existing_wealth),
        ];
        for (field, value) in amounts {
            if value < Decimal::ZERO {
                warn!(field, value = %value, "rejecting negative simulation input");
                return Err(SimulationError::validation(
                    field,
                    format!("must be non-negative, got {value}"),
                ));
            }
        }

        if self.fiscal_parts <= Decimal::ZERO {
            warn!(fiscal_parts = %self.fiscal_parts, "rejecting non-positive fiscal parts");
            return Err(SimulationError::validation(
                "fiscal_parts",
                format!("must be positive, got {}", self.fiscal_parts),
            ));
        }

        Ok(())
    }

    /// Pre-tax profit pool to split between salary and dividends.
    ///
    /// Expenses above revenue clamp the pool to zero rather than failing.
    pub fn taxable_base(&self) -> Decimal {
        let base = self.projected_revenue - self.deductible_expenses;
        if base < Decimal::ZERO {
            warn!(
                projected_revenue = %self.projected_revenue,
                deductible_expenses = %self.deductible_expenses,
                "expenses exceed revenue; taxable base clamped to zero"
            );
            return Decimal::ZERO;
        }
        base
    }
}
