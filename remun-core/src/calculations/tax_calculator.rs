//! Pure tax functions over scalar inputs and a [`BracketTable`].
//!
//! Every amount returned is rounded half-up to the cent. The functions never
//! fail for non-negative inputs against a validated table, except when the
//! family quotient itself cannot be represented.
//!
//! | Function                           | Base                | Shape                       |
//! |------------------------------------|---------------------|-----------------------------|
//! | [`corporate_tax`]                  | company profit      | two tiers around a threshold|
//! | [`social_contributions`]           | gross salary        | proportional                |
//! | [`progressive_income_tax`]         | household income    | marginal, per fiscal part   |
//! | [`marginal_progressive_income_tax`]| an extra income leg | difference of two schedules |
//! | [`dividend_flat_tax`]              | gross dividends     | proportional                |

use rust_decimal::Decimal;

use crate::calculations::common::round_half_up;
use crate::error::SimulationError;
use crate::models::{BracketTable, IncomeTaxBracket};

/// Two-tier corporate tax on `taxable_base`.
///
/// A negative base is clamped to zero rather than rejected: a company with no
/// profit left after salary simply owes nothing.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use remun_core::calculations::tax_calculator::corporate_tax;
/// # use remun_core::{BracketTable, IncomeTaxBracket};
/// # let table = BracketTable {
/// #     fiscal_year: 2025,
/// #     corporate_tax_threshold: dec!(42500),
/// #     corporate_tax_rate_below: dec!(0.15),
/// #     corporate_tax_rate_above: dec!(0.25),
/// #     dividend_flat_tax_rate: dec!(0.30),
/// #     social_contribution_rate: dec!(0.45),
/// #     income_tax_brackets: vec![IncomeTaxBracket::unbounded(dec!(0.20))],
/// # };
///
/// // 42500 × 15% + (120000 − 42500) × 25%
/// assert_eq!(corporate_tax(dec!(120000), &table).unwrap(), dec!(25750.00));
/// ```
pub fn corporate_tax(
    taxable_base: Decimal,
    table: &BracketTable,
) -> Result<Decimal, SimulationError> {
    let base = taxable_base.max(Decimal::ZERO);
    let threshold = table.corporate_tax_threshold;

    let tax = if base > threshold {
        threshold * table.corporate_tax_rate_below
            + (base - threshold) * table.corporate_tax_rate_above
    } else {
        base * table.corporate_tax_rate_below
    };

    Ok(round_half_up(tax))
}

/// Blended social contributions on `gross_salary`.
pub fn social_contributions(
    gross_salary: Decimal,
    table: &BracketTable,
) -> Result<Decimal, SimulationError> {
    ensure_non_negative("gross_salary", gross_salary)?;
    Ok(round_half_up(gross_salary * table.social_contribution_rate))
}

/// Household income tax under the family-quotient mechanism.
///
/// The income is divided by `fiscal_parts`, the schedule is applied
/// marginally to that quotient (each rate only taxes the slice of income
/// inside its bracket), and the per-part tax is multiplied back by
/// `fiscal_parts`.
///
/// # Errors
///
/// Returns [`SimulationError::Validation`] if `taxable_income` is negative,
/// `fiscal_parts` is not positive, or the quotient income is too large to
/// represent (a vanishingly small `fiscal_parts`).
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use remun_core::calculations::tax_calculator::progressive_income_tax;
/// # use remun_core::{BracketTable, IncomeTaxBracket};
/// # let table = BracketTable {
/// #     fiscal_year: 2025,
/// #     corporate_tax_threshold: dec!(42500),
/// #     corporate_tax_rate_below: dec!(0.15),
/// #     corporate_tax_rate_above: dec!(0.25),
/// #     dividend_flat_tax_rate: dec!(0.30),
/// #     social_contribution_rate: dec!(0.45),
/// #     income_tax_brackets: vec![
/// #         IncomeTaxBracket::bounded(dec!(11497), dec!(0)),
/// #         IncomeTaxBracket::bounded(dec!(29315), dec!(0.11)),
/// #         IncomeTaxBracket::bounded(dec!(83823), dec!(0.30)),
/// #         IncomeTaxBracket::bounded(dec!(180294), dec!(0.41)),
/// #         IncomeTaxBracket::unbounded(dec!(0.45)),
/// #     ],
/// # };
///
/// // (29315 − 11497) × 11% + (50000 − 29315) × 30%
/// assert_eq!(progressive_income_tax(dec!(50000), dec!(1), &table).unwrap(), dec!(8165.48));
///
/// // Two parts: 25000 per part, taxed (25000 − 11497) × 11%, then doubled
/// assert_eq!(progressive_income_tax(dec!(50000), dec!(2), &table).unwrap(), dec!(2970.66));
/// ```
pub fn progressive_income_tax(
    taxable_income: Decimal,
    fiscal_parts: Decimal,
    table: &BracketTable,
) -> Result<Decimal, SimulationError> {
    ensure_non_negative("taxable_income", taxable_income)?;
    ensure_positive_parts(fiscal_parts)?;

    if taxable_income.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let quotient = taxable_income
        .checked_div(fiscal_parts)
        .ok_or_else(|| parts_out_of_range(fiscal_parts))?;
    let tax_per_part = schedule_tax(quotient, &table.income_tax_brackets);
    let tax = tax_per_part
        .checked_mul(fiscal_parts)
        .ok_or_else(|| parts_out_of_range(fiscal_parts))?;

    Ok(round_half_up(tax))
}

/// Share of household income tax attributable to `additional_income` when it
/// is stacked on top of `existing_income`.
///
/// Both legs share the same brackets, so the extra leg is charged the
/// difference between the schedule with and without it. Taxing each leg
/// independently would let both start in the lowest bracket.
pub fn marginal_progressive_income_tax(
    additional_income: Decimal,
    existing_income: Decimal,
    fiscal_parts: Decimal,
    table: &BracketTable,
) -> Result<Decimal, SimulationError> {
    ensure_non_negative("additional_income", additional_income)?;

    let combined_income = existing_income.checked_add(additional_income).ok_or_else(|| {
        SimulationError::validation(
            "additional_income",
            format!("{additional_income} on top of {existing_income} overflows"),
        )
    })?;
    let with_addition = progressive_income_tax(combined_income, fiscal_parts, table)?;
    let without_addition = progressive_income_tax(existing_income, fiscal_parts, table)?;

    Ok(with_addition - without_addition)
}

/// Flat tax on `gross_dividends`.
pub fn dividend_flat_tax(
    gross_dividends: Decimal,
    table: &BracketTable,
) -> Result<Decimal, SimulationError> {
    ensure_non_negative("gross_dividends", gross_dividends)?;
    Ok(round_half_up(gross_dividends * table.dividend_flat_tax_rate))
}

/// Unrounded tax on one part's quotient income.
fn schedule_tax(
    quotient: Decimal,
    brackets: &[IncomeTaxBracket],
) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;

    for bracket in brackets {
        if quotient <= lower {
            break;
        }
        let upper = bracket
            .upper_threshold
            .map_or(quotient, |threshold| threshold.min(quotient));
        tax += (upper - lower) * bracket.marginal_rate;

        match bracket.upper_threshold {
            Some(threshold) => lower = threshold,
            None => break,
        }
    }

    tax
}

fn ensure_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), SimulationError> {
    if value < Decimal::ZERO {
        return Err(SimulationError::validation(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(())
}

fn ensure_positive_parts(fiscal_parts: Decimal) -> Result<(), SimulationError> {
    if fiscal_parts <= Decimal::ZERO {
        return Err(SimulationError::validation(
            "fiscal_parts",
            format!("must be positive, got {fiscal_parts}"),
        ));
    }
    Ok(())
}

fn parts_out_of_range(fiscal_parts: Decimal) -> SimulationError {
    SimulationError::validation(
        "fiscal_parts",
        format!("{fiscal_parts} puts the quotient income out of range"),
    )
}
