//! Integration tests that exercise the batch path against an on-disk fixture
//! file: load, simulate on the built-in rule sets, write CSV.

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use remun_cli::config::CliConfig;
use remun_cli::{app, batch, csv_loader};
use remun_core::MaritalStatus;
use rust_decimal_macros::dec;

/// Path to the sample CSV shipped with the test fixtures.
fn fixture_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample_inputs.csv")
        .leak()
}

#[test]
fn test_load_fixture_file_succeeds() {
    let rows = csv_loader::load_from_file(fixture_path()).expect("fixture file should load");

    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.input.is_ok()));
}

#[test]
fn test_load_fixture_rows_apply_defaults() {
    let rows = csv_loader::load_from_file(fixture_path()).unwrap();

    let single = rows[0].input.as_ref().unwrap();
    assert_eq!(single.marital_status, MaritalStatus::Single);
    assert_eq!(single.fiscal_parts, dec!(1));
    assert_eq!(single.other_household_income, dec!(0));

    let married = rows[1].input.as_ref().unwrap();
    assert_eq!(married.marital_status, MaritalStatus::Married);
    assert_eq!(married.fiscal_parts, dec!(2));

    let with_income = rows[2].input.as_ref().unwrap();
    assert_eq!(with_income.other_household_income, dec!(30000.00));
    assert_eq!(with_income.existing_wealth, dec!(80000.00));
}

#[test]
fn test_load_missing_file_fails() {
    let err = csv_loader::load_from_file(Path::new("tests/fixtures/missing.csv")).unwrap_err();

    assert!(matches!(err, csv_loader::CsvLoadError::Io { .. }));
}

#[tokio::test]
async fn test_fixture_batch_against_builtin_rules() {
    let simulator = Arc::new(app::build_simulator(&CliConfig::default()).unwrap());
    let rows = csv_loader::load_from_file(fixture_path()).unwrap();

    let outcomes = batch::run_batch(simulator, rows, 2025).await;

    let results: Vec<_> = outcomes
        .iter()
        .map(|o| o.result.as_ref().expect("every fixture row simulates"))
        .collect();
    assert_eq!(results[0].optimal.gross_salary, dec!(20903.63));
    assert_eq!(results[0].optimal.net_disposable_income, dec!(66497.60));
    assert_eq!(results[1].optimal.gross_salary, dec!(41807.27));
    assert_eq!(results[1].optimal.net_disposable_income, dec!(67020.18));
    // Other income already fills the 0% bracket: all dividends wins.
    assert_eq!(results[2].optimal.gross_salary, dec!(0));
    assert_eq!(results[2].optimal.net_disposable_income, dec!(65975.00));
    // Expenses exceed revenue.
    assert_eq!(results[3].taxable_base, dec!(0));
    assert_eq!(results[3].optimal.net_disposable_income, dec!(0));
}

#[tokio::test]
async fn test_fixture_batch_writes_one_line_per_row() {
    let simulator = Arc::new(app::build_simulator(&CliConfig::default()).unwrap());
    let rows = csv_loader::load_from_file(fixture_path()).unwrap();
    let outcomes = batch::run_batch(simulator, rows, 2025).await;
    let mut buffer = Vec::new();

    batch::write_csv(&outcomes, &mut buffer).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("1,ok,20903.63,"));
    assert!(lines[4].starts_with("4,ok,0"));
}
