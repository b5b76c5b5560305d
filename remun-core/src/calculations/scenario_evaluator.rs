//! Resolves a single salary/dividend split into a [`Scenario`].
//!
//! # Evaluation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Social contributions on gross salary |
//! | 2    | Remaining profit: taxable base − gross salary |
//! | 3    | Corporate tax on remaining profit |
//! | 4    | Gross dividends: remaining profit − corporate tax (all distributed) |
//! | 5    | Net salary: gross salary − social contributions |
//! | 6    | Personal taxable income: net salary + other household income |
//! | 7    | Income tax on salary: marginal share of step 6 over other income alone |
//! | 8    | Flat tax on gross dividends |
//! | 9    | Net disposable income: (5) − (7) + (4) − (8) |
//! | 10   | Effective overall rate: 1 − (9) / taxable base, 0 for an empty base |
//!
//! Salary is fully deductible from the corporate base, so corporate tax only
//! ever sees step 2. Contributions reduce the salary leg, never the
//! corporate one.

use rust_decimal::Decimal;
use tracing::trace;

use crate::calculations::common::round_rate;
use crate::calculations::tax_calculator::{
    corporate_tax, dividend_flat_tax, marginal_progressive_income_tax, social_contributions,
};
use crate::error::SimulationError;
use crate::models::{BracketTable, Scenario, SimulationInput};

/// Evaluates scenarios for one validated input against one rule set.
#[derive(Debug, Clone)]
pub struct ScenarioEvaluator<'a> {
    table: &'a BracketTable,
    input: &'a SimulationInput,
    taxable_base: Decimal,
}

impl<'a> ScenarioEvaluator<'a> {
    /// Validates `input` and captures its taxable base.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Validation`] if the input is malformed.
    pub fn new(
        table: &'a BracketTable,
        input: &'a SimulationInput,
    ) -> Result<Self, SimulationError> {
        input.validate()?;
        Ok(Self {
            table,
            input,
            taxable_base: input.taxable_base(),
        })
    }

    pub fn taxable_base(&self) -> Decimal {
        self.taxable_base
    }

    pub fn table(&self) -> &'a BracketTable {
        self.table
    }

    pub fn input(&self) -> &'a SimulationInput {
        self.input
    }

    /// Computes the scenario for `gross_salary`.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Validation`] if `gross_salary` is outside
    ///   `[0, taxable_base]`
    /// - [`SimulationError::NumericalInstability`] if the resolved scenario
    ///   fails reconciliation against the taxable base
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use remun_core::calculations::ScenarioEvaluator;
    /// use remun_core::{BracketTable, IncomeTaxBracket, MaritalStatus, SimulationInput};
    ///
    /// let table = BracketTable {
    ///     fiscal_year: 2025,
    ///     corporate_tax_threshold: dec!(42500),
    ///     corporate_tax_rate_below: dec!(0.15),
    ///     corporate_tax_rate_above: dec!(0.25),
    ///     dividend_flat_tax_rate: dec!(0.30),
    ///     social_contribution_rate: dec!(0.45),
    ///     income_tax_brackets: vec![
    ///         IncomeTaxBracket::bounded(dec!(11497), dec!(0)),
    ///         IncomeTaxBracket::unbounded(dec!(0.30)),
    ///     ],
    /// };
    /// let input = SimulationInput {
    ///     projected_revenue: dec!(150000),
    ///     deductible_expenses: dec!(30000),
    ///     marital_status: MaritalStatus::Single,
    ///     fiscal_parts: dec!(1),
    ///     other_household_income: dec!(0),
    ///     existing_wealth: dec!(0),
    /// };
    ///
    /// let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();
    /// let scenario = evaluator.evaluate(dec!(0)).unwrap();
    ///
    /// assert_eq!(scenario.corporate_tax_due, dec!(25750.00));
    /// assert_eq!(scenario.gross_dividends, dec!(94250.00));
    /// assert_eq!(scenario.net_disposable_income, dec!(65975.00));
    /// ```
    pub fn evaluate(
        &self,
        gross_salary: Decimal,
    ) -> Result<Scenario, SimulationError> {
        if gross_salary < Decimal::ZERO || gross_salary > self.taxable_base {
            return Err(SimulationError::validation(
                "gross_salary",
                format!(
                    "must be between 0 and the taxable base {}, got {gross_salary}",
                    self.taxable_base
                ),
            ));
        }

        // Step 1
        let social = social_contributions(gross_salary, self.table)?;

        // Steps 2-4
        let remaining_profit = self.remaining_profit(gross_salary);
        let corporate_tax_due = corporate_tax(remaining_profit, self.table)?;
        let gross_dividends = remaining_profit - corporate_tax_due;

        // Steps 5-7
        let net_salary = gross_salary - social;
        let income_tax_on_salary = marginal_progressive_income_tax(
            net_salary,
            self.input.other_household_income,
            self.input.fiscal_parts,
            self.table,
        )?;

        // Step 8
        let income_tax_on_dividends = dividend_flat_tax(gross_dividends, self.table)?;

        // Steps 9-10
        let net_disposable_income =
            net_salary - income_tax_on_salary + gross_dividends - income_tax_on_dividends;
        let effective_overall_tax_rate = self.effective_rate(net_disposable_income);

        let scenario = Scenario {
            gross_salary,
            gross_dividends,
            social_contributions: social,
            corporate_tax_due,
            income_tax_on_salary,
            income_tax_on_dividends,
            net_disposable_income,
            effective_overall_tax_rate,
        };

        scenario.reconcile(self.taxable_base)?;

        trace!(
            gross_salary = %gross_salary,
            net_disposable_income = %net_disposable_income,
            "evaluated scenario"
        );

        Ok(scenario)
    }

    /// Profit left in the company once salary is paid (step 2).
    fn remaining_profit(
        &self,
        gross_salary: Decimal,
    ) -> Decimal {
        self.taxable_base - gross_salary
    }

    /// Share of the taxable base lost to taxes and contributions (step 10).
    fn effective_rate(
        &self,
        net_disposable_income: Decimal,
    ) -> Decimal {
        if self.taxable_base.is_zero() {
            return Decimal::ZERO;
        }
        round_rate(Decimal::ONE - net_disposable_income / self.taxable_base)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{IncomeTaxBracket, MaritalStatus};

    fn test_table() -> BracketTable {
        BracketTable {
            fiscal_year: 2025,
            corporate_tax_threshold: dec!(42500),
            corporate_tax_rate_below: dec!(0.15),
            corporate_tax_rate_above: dec!(0.25),
            dividend_flat_tax_rate: dec!(0.30),
            social_contribution_rate: dec!(0.45),
            income_tax_brackets: vec![
                IncomeTaxBracket::bounded(dec!(11497), dec!(0)),
                IncomeTaxBracket::bounded(dec!(29315), dec!(0.11)),
                IncomeTaxBracket::bounded(dec!(83823), dec!(0.30)),
                IncomeTaxBracket::bounded(dec!(180294), dec!(0.41)),
                IncomeTaxBracket::unbounded(dec!(0.45)),
            ],
        }
    }

    fn test_input() -> SimulationInput {
        SimulationInput {
            projected_revenue: dec!(150000),
            deductible_expenses: dec!(30000),
            marital_status: MaritalStatus::Single,
            fiscal_parts: dec!(1),
            other_household_income: dec!(0),
            existing_wealth: dec!(0),
        }
    }

    // =========================================================================
    // construction tests
    // =========================================================================

    #[test]
    fn new_captures_taxable_base() {
        let table = test_table();
        let input = test_input();

        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        assert_eq!(evaluator.taxable_base(), dec!(120000));
    }

    #[test]
    fn new_rejects_invalid_input() {
        let table = test_table();
        let mut input = test_input();
        input.fiscal_parts = dec!(-1);

        let err = ScenarioEvaluator::new(&table, &input).unwrap_err();

        assert_eq!(err.field(), Some("fiscal_parts"));
    }

    // =========================================================================
    // evaluate tests
    // =========================================================================

    #[test]
    fn evaluate_all_dividends() {
        let table = test_table();
        let input = test_input();
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        let scenario = evaluator.evaluate(dec!(0)).unwrap();

        assert_eq!(scenario.gross_salary, dec!(0));
        assert_eq!(scenario.social_contributions, dec!(0.00));
        assert_eq!(scenario.corporate_tax_due, dec!(25750.00));
        assert_eq!(scenario.gross_dividends, dec!(94250.00));
        assert_eq!(scenario.income_tax_on_salary, dec!(0));
        assert_eq!(scenario.income_tax_on_dividends, dec!(28275.00));
        assert_eq!(scenario.net_disposable_income, dec!(65975.00));
        // 1 − 65975 / 120000
        assert_eq!(scenario.effective_overall_tax_rate, dec!(0.450208));
    }

    #[test]
    fn evaluate_all_salary() {
        let table = test_table();
        let input = test_input();
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        let scenario = evaluator.evaluate(dec!(120000)).unwrap();

        assert_eq!(scenario.social_contributions, dec!(54000.00));
        assert_eq!(scenario.corporate_tax_due, dec!(0.00));
        assert_eq!(scenario.gross_dividends, dec!(0.00));
        // Net salary 66000: 1959.98 + (66000 − 29315) × 0.30
        assert_eq!(scenario.income_tax_on_salary, dec!(12965.48));
        assert_eq!(scenario.income_tax_on_dividends, dec!(0.00));
        assert_eq!(scenario.net_disposable_income, dec!(53034.52));
    }

    #[test]
    fn evaluate_mixed_split() {
        let table = test_table();
        let input = test_input();
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        let scenario = evaluator.evaluate(dec!(40000)).unwrap();

        assert_eq!(scenario.social_contributions, dec!(18000.00));
        // Remaining 80000: 6375 + 37500 × 0.25
        assert_eq!(scenario.corporate_tax_due, dec!(15750.00));
        assert_eq!(scenario.gross_dividends, dec!(64250.00));
        // Net salary 22000: (22000 − 11497) × 0.11
        assert_eq!(scenario.income_tax_on_salary, dec!(1155.33));
        assert_eq!(scenario.income_tax_on_dividends, dec!(19275.00));
        // 22000 − 1155.33 + 64250 − 19275
        assert_eq!(scenario.net_disposable_income, dec!(65819.67));
    }

    #[test]
    fn evaluate_charges_salary_only_its_marginal_share() {
        let table = test_table();
        let mut input = test_input();
        input.other_household_income = dec!(30000);
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        let scenario = evaluator.evaluate(dec!(40000)).unwrap();

        // Net salary 22000 stacked on 30000 of other income lands in the 30% bracket.
        assert_eq!(scenario.income_tax_on_salary, dec!(6600.00));
    }

    #[test]
    fn evaluate_reconciles_to_taxable_base() {
        let table = test_table();
        let input = test_input();
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        for salary in [dec!(0), dec!(0.01), dec!(20903.63), dec!(77500), dec!(120000)] {
            let scenario = evaluator.evaluate(salary).unwrap();

            assert_eq!(
                scenario.gross_salary + scenario.gross_dividends + scenario.corporate_tax_due,
                dec!(120000),
                "salary {salary} does not reconcile"
            );
        }
    }

    #[test]
    fn evaluate_rejects_salary_above_base() {
        let table = test_table();
        let input = test_input();
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        let err = evaluator.evaluate(dec!(120000.01)).unwrap_err();

        assert_eq!(err.field(), Some("gross_salary"));
    }

    #[test]
    fn evaluate_rejects_negative_salary() {
        let table = test_table();
        let input = test_input();
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        let err = evaluator.evaluate(dec!(-1)).unwrap_err();

        assert_eq!(err.field(), Some("gross_salary"));
    }

    #[test]
    fn evaluate_zero_base_yields_zero_rate() {
        let table = test_table();
        let mut input = test_input();
        input.deductible_expenses = dec!(150000);
        let evaluator = ScenarioEvaluator::new(&table, &input).unwrap();

        let scenario = evaluator.evaluate(dec!(0)).unwrap();

        assert_eq!(scenario.net_disposable_income, dec!(0));
        assert_eq!(scenario.effective_overall_tax_rate, dec!(0));
    }
}
