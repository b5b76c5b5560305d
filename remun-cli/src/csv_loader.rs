//! CSV loader for batch simulation input.
//!
//! ## CSV Format
//!
//! Column order does **not** matter (headers are matched by name). Header
//! names are case-sensitive.
//!
//! | Column                   | Required | Type    | Notes                                        |
//! |--------------------------|----------|---------|----------------------------------------------|
//! | `projected_revenue`      | yes      | decimal | e.g. `150000.00`                             |
//! | `deductible_expenses`    | yes      | decimal |                                              |
//! | `marital_status`         | no       | string  | `single` (default), `married`, `civil_union` |
//! | `fiscal_parts`           | no       | decimal | Defaults to 1 for single, 2 for couples      |
//! | `other_household_income` | no       | decimal | Defaults to 0                                |
//! | `existing_wealth`        | no       | decimal | Defaults to 0                                |
//!
//! ### Example
//!
//! ```csv
//! projected_revenue,deductible_expenses,marital_status,fiscal_parts,other_household_income,existing_wealth
//! 150000.00,30000.00,single,,,
//! 90000.00,12000.00,married,2.5,18000.00,
//! ```
//!
//! A structurally broken file (unreadable, missing a required column) fails
//! as a whole. A bad row only fails that row, so a batch can report it and
//! carry on.
use std::path::Path;

use remun_core::{MaritalStatus, SimulationInput};
use rust_decimal::Decimal;
use serde::Deserialize;

const REQUIRED_COLUMNS: [&str; 2] = ["projected_revenue", "deductible_expenses"];

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout exactly
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    projected_revenue: Decimal,
    deductible_expenses: Decimal,
    #[serde(default)]
    marital_status: Option<String>,
    #[serde(default)]
    fiscal_parts: Option<Decimal>,
    #[serde(default)]
    other_household_income: Option<Decimal>,
    #[serde(default)]
    existing_wealth: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or converting CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The header row could not be read.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    /// A row could not be deserialised (bad decimal, wrong column count).
    /// `row` is 1-based (header = row 0).
    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: csv::Error,
    },

    /// A `marital_status` cell is not one of the recognised codes.
    #[error("unrecognised marital status '{status}' on row {row}")]
    InvalidMaritalStatus { status: String, row: usize },
}

/// One data row with its 1-based row number.
#[derive(Debug)]
pub struct BatchRow {
    pub row: usize,
    pub input: Result<SimulationInput, CsvLoadError>,
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

/// Convert a single CSV row into a SimulationInput.
fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<SimulationInput, CsvLoadError> {
    let marital_status = match row.marital_status {
        Some(status) => MaritalStatus::parse(&status).ok_or(
            CsvLoadError::InvalidMaritalStatus {
                status,
                row: row_number,
            },
        )?,
        None => MaritalStatus::default(),
    };

    Ok(SimulationInput {
        projected_revenue: row.projected_revenue,
        deductible_expenses: row.deductible_expenses,
        marital_status,
        fiscal_parts: row
            .fiscal_parts
            .unwrap_or_else(|| marital_status.default_fiscal_parts()),
        other_household_income: row.other_household_income.unwrap_or(Decimal::ZERO),
        existing_wealth: row.existing_wealth.unwrap_or(Decimal::ZERO),
    })
}

/// Parse CSV text and return one [`BatchRow`] per data row, in file order.
///
/// # Errors
///
/// * [CsvLoadError::Parse] if the header row cannot be read.
/// * [CsvLoadError::MissingColumn] if a required column is absent.
///
/// Per-row failures are carried in [`BatchRow::input`].
pub fn load_from_str(input: &str) -> Result<Vec<BatchRow>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All) // tolerate whitespace around values
        .flexible(false) // strict column count
        .from_reader(input.as_bytes());

    let headers = reader.headers()?;
    if let Some(missing) = REQUIRED_COLUMNS
        .into_iter()
        .find(|column| !headers.iter().any(|header| header == *column))
    {
        return Err(CsvLoadError::MissingColumn(missing));
    }

    let rows = reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row_number = idx + 1; // 1-based for user-facing messages
            let input = result
                .map_err(|source| CsvLoadError::InvalidRow {
                    row: row_number,
                    source,
                })
                .and_then(|row| convert_row(row, row_number));
            BatchRow {
                row: row_number,
                input,
            }
        })
        .collect();

    Ok(rows)
}

/// Convenience wrapper: read a file from disk and delegate to [load_from_str].
pub fn load_from_file(path: &Path) -> Result<Vec<BatchRow>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_from_str(&contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    // -----------------------------------------------------------------------
    // Helper: the required columns only
    // -----------------------------------------------------------------------
    const MINIMAL_CSV: &str = "\
projected_revenue,deductible_expenses
150000.00,30000.00
";

    // -----------------------------------------------------------------------
    // Helper: every column populated
    // -----------------------------------------------------------------------
    const FULL_CSV: &str = "\
projected_revenue,deductible_expenses,marital_status,fiscal_parts,other_household_income,existing_wealth
90000.00,12000.00,married,2.5,18000.00,250000.00
";

    fn inputs(rows: Vec<BatchRow>) -> Vec<SimulationInput> {
        rows.into_iter()
            .map(|row| row.input.expect("row should be valid"))
            .collect()
    }

    #[test]
    fn test_minimal_csv_uses_defaults() {
        let rows = inputs(load_from_str(MINIMAL_CSV).unwrap());

        assert_eq!(
            rows,
            vec![SimulationInput {
                projected_revenue: dec!(150000.00),
                deductible_expenses: dec!(30000.00),
                marital_status: MaritalStatus::Single,
                fiscal_parts: dec!(1),
                other_household_income: dec!(0),
                existing_wealth: dec!(0),
            }]
        );
    }

    #[test]
    fn test_full_csv_maps_every_column() {
        let rows = inputs(load_from_str(FULL_CSV).unwrap());

        assert_eq!(
            rows,
            vec![SimulationInput {
                projected_revenue: dec!(90000.00),
                deductible_expenses: dec!(12000.00),
                marital_status: MaritalStatus::Married,
                fiscal_parts: dec!(2.5),
                other_household_income: dec!(18000.00),
                existing_wealth: dec!(250000.00),
            }]
        );
    }

    #[test]
    fn test_couple_without_parts_defaults_to_two() {
        let csv = "projected_revenue,deductible_expenses,marital_status,fiscal_parts\n\
                   80000,10000,civil_union,\n";

        let rows = inputs(load_from_str(csv).unwrap());

        assert_eq!(rows[0].fiscal_parts, dec!(2));
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let csv = "deductible_expenses,marital_status,projected_revenue\n5000,single,60000\n";

        let rows = inputs(load_from_str(csv).unwrap());

        assert_eq!(rows[0].projected_revenue, dec!(60000));
        assert_eq!(rows[0].deductible_expenses, dec!(5000));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let csv = "projected_revenue , deductible_expenses\n  150000.00 ,  30000.00 \n";

        let rows = inputs(load_from_str(csv).unwrap());

        assert_eq!(rows[0].projected_revenue, dec!(150000.00));
    }

    #[test]
    fn test_missing_required_column_fails_whole_file() {
        let csv = "projected_revenue,marital_status\n150000,single\n";

        let err = load_from_str(csv).unwrap_err();

        assert!(matches!(
            err,
            CsvLoadError::MissingColumn("deductible_expenses")
        ));
    }

    #[test]
    fn test_bad_row_does_not_stop_later_rows() {
        let csv = "\
projected_revenue,deductible_expenses,marital_status
150000,30000,single
abc,30000,single
60000,5000,widowed
90000,12000,married
";

        let rows = load_from_str(csv).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.iter().map(|r| r.row).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(rows[0].input.is_ok());
        assert!(matches!(
            rows[1].input,
            Err(CsvLoadError::InvalidRow { row: 2, .. })
        ));
        let Err(CsvLoadError::InvalidMaritalStatus { status, row }) = &rows[2].input else {
            panic!("Expected InvalidMaritalStatus, got: {:?}", rows[2].input);
        };
        assert_eq!(status, "widowed");
        assert_eq!(*row, 3);
        assert!(rows[3].input.is_ok());
    }

    #[test]
    fn test_wrong_column_count_is_a_row_error() {
        let csv = "projected_revenue,deductible_expenses\n150000,30000,extra\n";

        let rows = load_from_str(csv).unwrap();

        assert!(matches!(
            rows[0].input,
            Err(CsvLoadError::InvalidRow { row: 1, .. })
        ));
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let rows = load_from_str("projected_revenue,deductible_expenses\n").unwrap();

        assert!(rows.is_empty());
    }
}
