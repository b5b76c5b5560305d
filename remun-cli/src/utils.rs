use remun_core::MaritalStatus;
use remun_core::calculations::common::round_half_up;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
/// Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses a marital status code (`single`, `married`, `civil_union`).
pub fn parse_marital_status(s: &str) -> Result<MaritalStatus, String> {
    MaritalStatus::parse(s.trim()).ok_or_else(|| {
        format!("unknown marital status '{s}' (expected single, married or civil_union)")
    })
}

/// Formats a rate as a percentage with two decimals.
pub fn format_rate(rate: Decimal) -> String {
    format!("{:.2}%", round_half_up(rate * Decimal::ONE_HUNDRED))
}
