use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rule-set invariants that a [`BracketTable`] must satisfy before it can be
/// registered for simulations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("fiscal year {0} has an empty income tax schedule")]
    EmptySchedule(i32),

    #[error("{name} must be between 0 and 1, got {rate}")]
    RateOutOfRange { name: &'static str, rate: Decimal },

    #[error("corporate tax threshold must be non-negative, got {0}")]
    NegativeCorporateThreshold(Decimal),

    #[error("bracket {index} threshold {threshold} must be positive")]
    NonPositiveThreshold { index: usize, threshold: Decimal },

    #[error("bracket {index} threshold {threshold} does not exceed previous threshold {previous}")]
    NonIncreasingThreshold {
        index: usize,
        threshold: Decimal,
        previous: Decimal,
    },

    #[error("bracket {index} rate {rate} is lower than previous rate {previous}")]
    DecreasingRate {
        index: usize,
        rate: Decimal,
        previous: Decimal,
    },

    #[error("bracket {0} is unbounded but is not the last bracket")]
    UnboundedBracketNotLast(usize),

    #[error("last bracket must be unbounded, got upper threshold {0}")]
    LastBracketBounded(Decimal),
}

/// One slice of the progressive personal income tax schedule, expressed per
/// fiscal part.
///
/// The slice runs from the previous bracket's `upper_threshold` (or zero for
/// the first bracket) up to and including its own `upper_threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxBracket {
    /// `None` marks the open-ended top bracket.
    pub upper_threshold: Option<Decimal>,
    pub marginal_rate: Decimal,
}

impl IncomeTaxBracket {
    pub fn bounded(
        upper_threshold: Decimal,
        marginal_rate: Decimal,
    ) -> Self {
        Self {
            upper_threshold: Some(upper_threshold),
            marginal_rate,
        }
    }

    pub fn unbounded(marginal_rate: Decimal) -> Self {
        Self {
            upper_threshold: None,
            marginal_rate,
        }
    }
}

/// The complete rule set for one fiscal year.
///
/// Tables are built once (see the `remun-data` loader), validated when they
/// are registered, and shared read-only behind an `Arc` for the lifetime of
/// the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTable {
    pub fiscal_year: i32,

    /// Profit up to this amount is taxed at `corporate_tax_rate_below`.
    pub corporate_tax_threshold: Decimal,
    pub corporate_tax_rate_below: Decimal,
    pub corporate_tax_rate_above: Decimal,

    /// Flat rate on gross dividends, income tax and social levies combined.
    pub dividend_flat_tax_rate: Decimal,

    /// Blended employer + employee contribution rate on gross salary.
    pub social_contribution_rate: Decimal,

    /// Ordered by ascending threshold; the last bracket is unbounded.
    pub income_tax_brackets: Vec<IncomeTaxBracket>,
}

impl BracketTable {
    /// Checks every rule-set invariant.
    ///
    /// # Errors
    ///
    /// Returns [`BracketTableError`] if:
    /// - any rate is outside [0, 1]
    /// - the corporate threshold is negative
    /// - the schedule is empty
    /// - thresholds are not strictly increasing and positive
    /// - rates decrease from one bracket to the next
    /// - the last bracket is bounded, or an earlier one is not
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use remun_core::{BracketTable, BracketTableError, IncomeTaxBracket};
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
    ///         IncomeTaxBracket::bounded(dec!(11000), dec!(0.11)),
    ///         IncomeTaxBracket::unbounded(dec!(0.30)),
    ///     ],
    /// };
    ///
    /// assert_eq!(
    ///     table.validate(),
    ///     Err(BracketTableError::NonIncreasingThreshold {
    ///         index: 1,
    ///         threshold: dec!(11000),
    ///         previous: dec!(11497),
    ///     })
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), BracketTableError> {
        check_rate("corporate_tax_rate_below", self.corporate_tax_rate_below)?;
        check_rate("corporate_tax_rate_above", self.corporate_tax_rate_above)?;
        check_rate("dividend_flat_tax_rate", self.dividend_flat_tax_rate)?;
        check_rate("social_contribution_rate", self.social_contribution_rate)?;

        if self.corporate_tax_threshold < Decimal::ZERO {
            return Err(BracketTableError::NegativeCorporateThreshold(
                self.corporate_tax_threshold,
            ));
        }

        if self.income_tax_brackets.is_empty() {
            return Err(BracketTableError::EmptySchedule(self.fiscal_year));
        }

        let last_index = self.income_tax_brackets.len() - 1;
        let mut previous_threshold: Option<Decimal> = None;
        let mut previous_rate: Option<Decimal> = None;

        for (index, bracket) in self.income_tax_brackets.iter().enumerate() {
            check_rate("income tax marginal_rate", bracket.marginal_rate)?;

            if let Some(previous) = previous_rate {
                if bracket.marginal_rate < previous {
                    return Err(BracketTableError::DecreasingRate {
                        index,
                        rate: bracket.marginal_rate,
                        previous,
                    });
                }
            }
            previous_rate = Some(bracket.marginal_rate);

            match (bracket.upper_threshold, index == last_index) {
                (None, true) => {}
                (None, false) => return Err(BracketTableError::UnboundedBracketNotLast(index)),
                (Some(threshold), true) => {
                    return Err(BracketTableError::LastBracketBounded(threshold));
                }
                (Some(threshold), false) => {
                    if threshold <= Decimal::ZERO {
                        return Err(BracketTableError::NonPositiveThreshold { index, threshold });
                    }
                    if let Some(previous) = previous_threshold {
                        if threshold <= previous {
                            return Err(BracketTableError::NonIncreasingThreshold {
                                index,
                                threshold,
                                previous,
                            });
                        }
                    }
                    previous_threshold = Some(threshold);
                }
            }
        }

        Ok(())
    }

    /// Bounded upper thresholds of the personal schedule, ascending.
    pub fn thresholds(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.income_tax_brackets
            .iter()
            .filter_map(|bracket| bracket.upper_threshold)
    }

    /// Marginal rate of the bracket whose range contains `quotient_income`.
    ///
    /// Ranges are half-open on the left: income exactly at a threshold still
    /// belongs to the lower bracket, since the last unit earned there was
    /// taxed at the lower rate.
    pub fn marginal_rate_at(
        &self,
        quotient_income: Decimal,
    ) -> Decimal {
        self.income_tax_brackets
            .iter()
            .find(|bracket| {
                bracket
                    .upper_threshold
                    .is_none_or(|upper| quotient_income <= upper)
            })
            .map(|bracket| bracket.marginal_rate)
            .unwrap_or(Decimal::ZERO)
    }
}

fn check_rate(
    name: &'static str,
    rate: Decimal,
) -> Result<(), BracketTableError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(BracketTableError::RateOutOfRange { name, rate });
    }
    Ok(())
}
