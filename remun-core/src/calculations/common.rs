//! Rounding helpers shared by every calculation.
//!
//! Currency amounts are carried to the cent; rates to six decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on reported rates.
pub const RATE_DECIMAL_PLACES: u32 = 6;

/// Rounds a currency amount to exactly two decimal places using half-up
/// rounding (midpoints move away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use remun_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a rate to [`RATE_DECIMAL_PLACES`].
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// The whole-cent amounts immediately at or below and at or above `value`.
///
/// Both are equal when `value` is already a whole number of cents.
///
/// ```
/// use rust_decimal_macros::dec;
/// use remun_core::calculations::common::cent_bounds;
///
/// assert_eq!(cent_bounds(dec!(20903.6363)), (dec!(20903.63), dec!(20903.64)));
/// assert_eq!(cent_bounds(dec!(17500)), (dec!(17500), dec!(17500)));
/// ```
pub fn cent_bounds(value: Decimal) -> (Decimal, Decimal) {
    (
        value.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity),
        value.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity),
    )
}

/// Formats a currency amount with thousands separators and two decimals.
///
/// ```
/// use rust_decimal_macros::dec;
/// use remun_core::calculations::common::format_amount;
///
/// assert_eq!(format_amount(dec!(13463.08)), "13,463.08");
/// ```
pub fn format_amount(value: Decimal) -> String {
    let rounded = round_half_up(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped}.{cents}")
}
