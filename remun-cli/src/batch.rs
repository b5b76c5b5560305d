//! Batch simulation: one independent simulation per input row.
//!
//! Rows run concurrently on tokio's blocking pool and results come back in
//! input order. A failed row is reported in place and never aborts the batch.

use std::io::Write;
use std::sync::Arc;

use remun_core::{SimulationError, SimulationResult, Simulator};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::csv_loader::{BatchRow, CsvLoadError};

#[derive(Debug, Error)]
pub enum BatchRowError {
    #[error(transparent)]
    Input(#[from] CsvLoadError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("simulation task failed: {0}")]
    Task(String),
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub row: usize,
    pub result: Result<SimulationResult, BatchRowError>,
}

/// Simulates every row against `fiscal_year`.
pub async fn run_batch(
    simulator: Arc<Simulator>,
    rows: Vec<BatchRow>,
    fiscal_year: i32,
) -> Vec<BatchOutcome> {
    let handles: Vec<_> = rows
        .into_iter()
        .map(|BatchRow { row, input }| {
            let simulator = Arc::clone(&simulator);
            let handle = tokio::task::spawn_blocking(move || -> Result<_, BatchRowError> {
                let input = input?;
                Ok(simulator.simulate(&input, fiscal_year)?)
            });
            (row, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (row, handle) in handles {
        let result = handle
            .await
            .map_err(|e| BatchRowError::Task(e.to_string()))
            .and_then(|result| result);

        if let Err(error) = &result {
            warn!(row, %error, "batch row failed");
        }
        outcomes.push(BatchOutcome { row, result });
    }

    debug!(
        rows = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
        "batch finished"
    );
    outcomes
}

/// One output line. Failed rows carry only `row`, `status` and `error`.
#[derive(Debug, Serialize, PartialEq)]
struct OutputRecord {
    row: usize,
    status: &'static str,
    optimal_gross_salary: Option<Decimal>,
    optimal_gross_dividends: Option<Decimal>,
    optimal_net_disposable_income: Option<Decimal>,
    optimal_effective_rate: Option<Decimal>,
    max_salary_net_disposable_income: Option<Decimal>,
    max_dividends_net_disposable_income: Option<Decimal>,
    error: Option<String>,
}

impl From<&BatchOutcome> for OutputRecord {
    fn from(outcome: &BatchOutcome) -> Self {
        match &outcome.result {
            Ok(result) => Self {
                row: outcome.row,
                status: "ok",
                optimal_gross_salary: Some(result.optimal.gross_salary),
                optimal_gross_dividends: Some(result.optimal.gross_dividends),
                optimal_net_disposable_income: Some(result.optimal.net_disposable_income),
                optimal_effective_rate: Some(result.optimal.effective_overall_tax_rate),
                max_salary_net_disposable_income: Some(result.max_salary.net_disposable_income),
                max_dividends_net_disposable_income: Some(
                    result.max_dividends.net_disposable_income,
                ),
                error: None,
            },
            Err(error) => Self {
                row: outcome.row,
                status: "error",
                optimal_gross_salary: None,
                optimal_gross_dividends: None,
                optimal_net_disposable_income: None,
                optimal_effective_rate: None,
                max_salary_net_disposable_income: None,
                max_dividends_net_disposable_income: None,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Writes one CSV line per outcome, with a header row.
pub fn write_csv<W: Write>(
    outcomes: &[BatchOutcome],
    writer: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for outcome in outcomes {
        writer.serialize(OutputRecord::from(outcome))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use remun_core::{BracketTable, BracketTableRegistry, IncomeTaxBracket};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::csv_loader::load_from_str;

    fn simulator() -> Arc<Simulator> {
        let table = BracketTable {
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
        };
        let registry = BracketTableRegistry::from_tables([table]).unwrap();
        Arc::new(Simulator::new(Arc::new(registry)))
    }

    const MIXED_CSV: &str = "\
projected_revenue,deductible_expenses,marital_status,fiscal_parts
150000,30000,single,
abc,30000,single,
150000,30000,married,
80000,5000,single,-1
";

    #[tokio::test]
    async fn test_run_batch_preserves_input_order() {
        let rows = load_from_str(MIXED_CSV).unwrap();

        let outcomes = run_batch(simulator(), rows, 2025).await;

        assert_eq!(
            outcomes.iter().map(|o| o.row).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        let first = outcomes[0].result.as_ref().unwrap();
        assert_eq!(first.optimal.gross_salary, dec!(20903.63));
        let third = outcomes[2].result.as_ref().unwrap();
        assert_eq!(third.optimal.gross_salary, dec!(41807.27));
    }

    #[tokio::test]
    async fn test_run_batch_reports_failures_per_row() {
        let rows = load_from_str(MIXED_CSV).unwrap();

        let outcomes = run_batch(simulator(), rows, 2025).await;

        assert!(matches!(
            outcomes[1].result,
            Err(BatchRowError::Input(CsvLoadError::InvalidRow { row: 2, .. }))
        ));
        let Err(BatchRowError::Simulation(error)) = &outcomes[3].result else {
            panic!("Expected a simulation error, got: {:?}", outcomes[3].result);
        };
        assert_eq!(error.field(), Some("fiscal_parts"));
    }

    #[tokio::test]
    async fn test_run_batch_unknown_year_fails_every_row() {
        let rows = load_from_str("projected_revenue,deductible_expenses\n1000,0\n2000,0\n").unwrap();

        let outcomes = run_batch(simulator(), rows, 2019).await;

        assert!(outcomes.iter().all(|o| matches!(
            o.result,
            Err(BatchRowError::Simulation(SimulationError::UnknownFiscalYear(2019)))
        )));
    }

    #[tokio::test]
    async fn test_write_csv_one_line_per_row() {
        let rows = load_from_str(MIXED_CSV).unwrap();
        let outcomes = run_batch(simulator(), rows, 2025).await;
        let mut buffer = Vec::new();

        write_csv(&outcomes, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "row,status,optimal_gross_salary,optimal_gross_dividends,\
             optimal_net_disposable_income,optimal_effective_rate,\
             max_salary_net_disposable_income,max_dividends_net_disposable_income,error"
        );
        assert!(lines[1].starts_with("1,ok,20903.63,"));
        assert!(lines[2].starts_with("2,error,,,,,,,"));
    }
}
